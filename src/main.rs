use std::path::PathBuf;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let workspace_root = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => match std::env::current_dir() {
            Ok(path) => path,
            Err(error) => {
                eprintln!("failed to resolve current directory: {error}");
                std::process::exit(1);
            }
        },
    };

    if let Err(error) = schedule_status::run(workspace_root).await {
        eprintln!("schedule-status failed: {error}");
        std::process::exit(1);
    }
}
