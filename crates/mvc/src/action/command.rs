use crate::backend::Backend;
use crate::error::BoxError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A command line entry point, `<AppId>_Command_<Name>`.
#[async_trait]
pub trait Command: Send + Sync {
    async fn run_cli(&self) -> Result<(), BoxError>;
}

type CommandCtor = Arc<dyn Fn(&Backend) -> Box<dyn Command> + Send + Sync>;

pub struct CommandClass {
    name: String,
    ctor: CommandCtor,
}

impl CommandClass {
    pub fn new<F>(name: impl Into<String>, ctor: F) -> Self
    where
        F: Fn(&Backend) -> Box<dyn Command> + Send + Sync + 'static,
    {
        Self { name: name.into(), ctor: Arc::new(ctor) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instantiate(&self, backend: &Backend) -> Box<dyn Command> {
        (self.ctor)(backend)
    }
}

impl fmt::Debug for CommandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandClass").field("name", &self.name).finish_non_exhaustive()
    }
}
