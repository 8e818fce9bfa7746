use bytes::Bytes;
use http::{Method, StatusCode};
use micro_mvc::{
    ActionResult, ApplicationBuilder, Bootstrap, ControllerClass, Fault, Kernel, KernelConfig, Request, Response,
    RouteError, Router,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Default)]
struct GuestbookController {
    entries: Mutex<Vec<String>>,
}

impl GuestbookController {
    async fn action(self: Arc<Self>, _request: Request) -> ActionResult {
        let entries = self.entries.lock().map_err(|e| Fault::internal(e.to_string()))?;
        Ok(Response::plain(StatusCode::OK, entries.join("\n")))
    }

    async fn show(self: Arc<Self>, request: Request) -> ActionResult {
        let index = request
            .parameter("index")
            .and_then(|index| index.parse::<usize>().ok())
            .ok_or_else(|| Fault::bad_request("index must be a number"))?;
        let entries = self.entries.lock().map_err(|e| Fault::internal(e.to_string()))?;
        let entry = entries.get(index).ok_or_else(|| Fault::not_found(format!("no entry {index}")))?;
        Ok(Response::render("entry", json!({ "index": index, "entry": entry })))
    }

    async fn sign(self: Arc<Self>, request: Request) -> ActionResult {
        let message = String::from_utf8(request.body().to_vec()).map_err(|e| Fault::bad_request(e.to_string()))?;
        let mut entries = self.entries.lock().map_err(|e| Fault::internal(e.to_string()))?;
        entries.push(message);
        let index = (entries.len() - 1).to_string();
        Ok(Response::redirect("entry", [("index", index)]))
    }
}

struct Guestbook;

impl Bootstrap for Guestbook {
    fn boot(&self, app: &mut ApplicationBuilder) {
        app.set_controller_namespace("guestbook");
        app.set_views_path(concat!(env!("CARGO_MANIFEST_DIR"), "/examples/views"));
        app.register_controller(
            "guestbook::GuestbookController",
            ControllerClass::new(GuestbookController::default)
                .action("action", GuestbookController::action)
                .action("show", GuestbookController::show)
                .action("sign", GuestbookController::sign),
        );
    }

    fn register_routes(&self, router: &mut Router) -> Result<(), RouteError> {
        router.get("/", "GuestbookController", None)?.name("index");
        router.get("/entries/{index}", "GuestbookController", Some("show"))?.name("entry");
        router.post("/entries", "GuestbookController", Some("sign"))?;
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let kernel = Kernel::bootstrap(&Guestbook, KernelConfig::default()).expect("routes should compile");

    let requests = [
        (Method::POST, "/entries", "hello from micro-mvc"),
        (Method::GET, "/entries/0", ""),
        (Method::GET, "/entries/9", ""),
        (Method::GET, "/", ""),
        (Method::GET, "/missing", ""),
    ];

    for (method, path, body) in requests {
        let request = http::Request::builder()
            .method(method.clone())
            .uri(path)
            .header(http::header::HOST, "127.0.0.1:8080")
            .body(Bytes::from_static(body.as_bytes()))
            .expect("request should be valid");

        let response = kernel.dispatch(request).await;
        info!(%method, path, status = %response.status(), headers = ?response.headers(), "dispatched");
        println!("{}\r\n", String::from_utf8_lossy(response.body()));
    }
}
