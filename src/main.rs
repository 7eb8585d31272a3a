#[tokio::main]
async fn main() -> std::io::Result<()> {
    fleet_battle_server::frameworks::server::run_with_config().await
}
