//! Name mangling between action names and class identifiers.
//!
//! Action names are snake_case (`user_profile`), class identifiers are made of
//! the application id, a namespace token and the PascalCase form of the action
//! name (`Sample_Action_UserProfile`). Identifiers are case sensitive.

use std::fmt;

/// Namespace token placed between the application id and the action part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Action,
    Form,
    Command,
}

impl ClassKind {
    pub fn token(self) -> &'static str {
        match self {
            ClassKind::Action => "Action",
            ClassKind::Form => "Form",
            ClassKind::Command => "Command",
        }
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// `"SAMPLE"` -> `"Sample"`
pub fn normalize_app_id(app_id: &str) -> String {
    ucfirst(&app_id.to_lowercase())
}

/// `"user_profile"` -> `"UserProfile"`
pub fn pascalize(name: &str) -> String {
    mangle(name, None)
}

/// `"user_profile"` -> `"User/Profile"`, the module path of an action.
pub fn module_path(name: &str) -> String {
    mangle(name, Some('/'))
}

/// Upper-cases the first character and every character following an
/// underscore, replacing the underscore by `joint` (or dropping it).
fn mangle(name: &str, joint: Option<char>) -> String {
    let source = ucfirst(name);
    let mut result = String::with_capacity(source.len());
    let mut chars = source.chars();

    while let Some(c) = chars.next() {
        if c != '_' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some(next) => {
                if let Some(joint) = joint {
                    result.push(joint);
                }
                result.extend(next.to_uppercase());
            }
            None => result.push(c),
        }
    }
    result
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `("Sample", Action, "user_profile")` -> `"Sample_Action_UserProfile"`
pub fn class_name(app_id: &str, kind: ClassKind, action_name: &str) -> String {
    format!("{}_{}_{}", app_id, kind, pascalize(action_name))
}

/// Inverse of [`class_name`]: `"Sample_Form_UserProfile"` -> `"user_profile"`.
///
/// Returns `None` when the class does not belong to the given namespace.
pub fn class_to_action_name(app_id: &str, kind: ClassKind, class_name: &str) -> Option<String> {
    let prefix = format!("{}_{}_", app_id, kind);
    let target = class_name.strip_prefix(prefix.as_str()).filter(|rest| !rest.is_empty())?;

    let mut action_name = String::with_capacity(target.len() + 4);
    for c in target.chars() {
        if c.is_ascii_uppercase() {
            action_name.push('_');
            action_name.push(c.to_ascii_lowercase());
        } else {
            action_name.push(c);
        }
    }
    Some(action_name.strip_prefix('_').map(str::to_string).unwrap_or(action_name))
}

/// `("Sample", "user_data")` -> `"Sample_UserDataManager"`
pub fn manager_class_name(app_id: &str, manager_type: &str) -> String {
    format!("{}_{}Manager", app_id, pascalize(manager_type))
}

/// `"/user/profile.tpl"` -> `"user_profile"`
pub fn forward_path_to_name(forward_path: &str, template_ext: &str) -> String {
    let path = forward_path.trim_start_matches('/');
    let suffix = format!(".{template_ext}");
    let path = path.strip_suffix(suffix.as_str()).unwrap_or(path);
    path.replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascalize() {
        assert_eq!(pascalize("login"), "Login");
        assert_eq!(pascalize("user_profile"), "UserProfile");
        assert_eq!(pascalize("a_b_c"), "ABC");
        assert_eq!(pascalize("trailing_"), "Trailing_");
        assert_eq!(pascalize(""), "");
    }

    #[test]
    fn test_module_path() {
        assert_eq!(module_path("user_profile"), "User/Profile");
        assert_eq!(module_path("login"), "Login");
    }

    #[test]
    fn test_class_name() {
        assert_eq!(class_name("Sample", ClassKind::Action, "user_profile"), "Sample_Action_UserProfile");
        assert_eq!(class_name("Sample", ClassKind::Form, "login"), "Sample_Form_Login");
        assert_eq!(class_name("Sample", ClassKind::Command, "cleanup_cache"), "Sample_Command_CleanupCache");
    }

    #[test]
    fn test_class_to_action_name() {
        assert_eq!(
            class_to_action_name("Sample", ClassKind::Action, "Sample_Action_UserProfile").as_deref(),
            Some("user_profile")
        );
        assert_eq!(class_to_action_name("Sample", ClassKind::Form, "Sample_Form_Login").as_deref(), Some("login"));
        assert_eq!(class_to_action_name("Sample", ClassKind::Form, "Sample_Action_Login"), None);
        assert_eq!(class_to_action_name("Sample", ClassKind::Form, "Sample_Form_"), None);
    }

    #[test]
    fn test_normalize_app_id() {
        assert_eq!(normalize_app_id("SAMPLE"), "Sample");
        assert_eq!(normalize_app_id("sample"), "Sample");
    }

    #[test]
    fn test_manager_class_name() {
        assert_eq!(manager_class_name("Sample", "color"), "Sample_ColorManager");
        assert_eq!(manager_class_name("Sample", "user_data"), "Sample_UserDataManager");
    }

    #[test]
    fn test_forward_path_to_name() {
        assert_eq!(forward_path_to_name("/user/profile.tpl", "tpl"), "user_profile");
        assert_eq!(forward_path_to_name("index.tpl", "tpl"), "index");
        assert_eq!(forward_path_to_name("index.html", "tpl"), "index.html");
    }
}
