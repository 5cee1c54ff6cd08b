use dotenv::dotenv;
use pos_server::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 设置环境 (dotenv, 工作目录, 日志)
    dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;
    let logs_dir = config.logs_dir();
    init_logger_with_file(None, logs_dir.to_str());

    // 打印横幅
    print_banner();

    tracing::info!("POS Server starting (flow: {})...", config.flow);

    // 2. 初始化服务器状态
    let state = ServerState::initialize(&config).await;

    // 3. 启动 HTTP 服务器
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
