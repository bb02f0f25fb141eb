#[tokio::main]
async fn main() -> std::io::Result<()> {
    grenade_server::frameworks::server::run_with_config().await
}
