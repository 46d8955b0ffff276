use sqlscope::core::CoreApp;

#[tokio::main]
async fn main() {
    match CoreApp::run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("\nError: {:#}\n", e);
            std::process::exit(2);
        }
    }
}
