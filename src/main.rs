#[tokio::main]
async fn main() -> std::process::ExitCode {
    clinic_backend::init_tracing();

    match clinic_backend::run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}
