use maskpen::EditorApp;

const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Pull the backend base URL out of the command line.
fn parse_server_arg() -> String {
    let mut server = DEFAULT_SERVER.to_string();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--server" => {
                if let Some(next) = args.next() {
                    server = next;
                }
            }
            other => {
                if let Some(url) = other.strip_prefix("--server=") {
                    server = url.to_string();
                }
            }
        }
    }
    server.trim_end_matches('/').to_string()
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let server = parse_server_arg();
    log::info!("using backend at {server}");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Maskpen",
        options,
        Box::new(move |cc| Ok(Box::new(EditorApp::new(cc, server)))),
    )
}
