use statsource::runtime::{boot, serve};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();

    // Optional single server id; every configured server otherwise.
    let only = match std::env::args().nth(1) {
        Some(arg) => Some(
            arg.parse::<i64>()
                .map_err(|e| format!("invalid server id {:?}: {}", arg, e))?,
        ),
        None => None,
    };

    let (config, catalog, sink) = boot::boot().await?;
    serve::serve(config, catalog, sink, only).await
}
