use async_trait::async_trait;
use bytes::Bytes;
use http::Request;
use http_body_util::{BodyExt, Full};
use micro_mvc::discovery::ClassRegistry;
use micro_mvc::form::{ActionForm, FieldDefinition, FieldKind, FormClass, RenderParams, escape};
use micro_mvc::service::builtin_classes;
use micro_mvc::settings::DEFAULT_FORM_CLASS;
use micro_mvc::{Action, ActionClass, ActionResult, AppSettings, Command, CommandClass, Html, Kernel, RequestContext, Responder};
use tracing::{Level, info};

struct Index;

#[async_trait]
impl Action for Index {
    async fn run(&self, _ctx: &mut RequestContext) -> ActionResult {
        Ok("hello world".into_response())
    }
}

struct Greet;

#[async_trait]
impl Action for Greet {
    async fn run(&self, ctx: &mut RequestContext) -> ActionResult {
        let name = ctx.action_form().and_then(|form| form.value("name")).map(|v| v.first().to_string());
        let helper = ctx.form_helper();
        let input = helper.render_field("name", Some("greet"), RenderParams::new());
        let submit = helper.form_submit(RenderParams::new().value("Greet"));
        let body = helper.form_block(&format!("{input}{submit}"), RenderParams::new().attr("method", "post"));
        Ok(Html(format!("<p>hello {}</p>{body}", escape(&name.unwrap_or_default()))).into_response())
    }
}

struct Cleanup;

#[async_trait]
impl Command for Cleanup {
    async fn run_cli(&self) -> Result<(), micro_mvc::BoxError> {
        info!("nothing to clean up");
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    micro_mvc::logging::init(Level::DEBUG);

    let registry = ClassRegistry::new()
        .with(ActionClass::new("Hello_Action_Index", |_| Box::new(Index)))
        .with(ActionClass::new("Hello_Action_Greet", |_| Box::new(Greet)))
        .with(FormClass::new("Hello_Form_Greet", |_| {
            ActionForm::new().with_field(FieldDefinition::new("name", FieldKind::Text).label("Name"))
        }))
        .with(FormClass::new(DEFAULT_FORM_CLASS, |_| ActionForm::new()))
        .with(CommandClass::new("Hello_Command_Cleanup", |_| Box::new(Cleanup)));
    let registry = builtin_classes().into_iter().fold(registry, ClassRegistry::with);

    let kernel = match Kernel::builder()
        .settings(AppSettings::builder("hello").default_action("index").build())
        .resolver(registry)
        .build()
    {
        Ok(kernel) => kernel,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    for uri in ["/", "/?action_greet=1&name=%3Cworld%3E", "/?action_missing=1"] {
        let request = Request::builder().uri(uri).header(http::header::HOST, "localhost").body(Full::<Bytes>::default());
        let Ok(request) = request else { continue };

        let response = kernel.handle(request).await;
        let status = response.status();
        let body = response.into_body().collect().await.map(|collected| collected.to_bytes()).unwrap_or_default();
        println!("GET {uri} -> {status}\n{}\n", String::from_utf8_lossy(&body));
    }

    if let Err(e) = kernel.console("cleanup").await {
        eprintln!("cleanup failed: {e}");
    }
}
