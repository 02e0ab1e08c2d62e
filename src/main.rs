use anyhow::Result;
use essay_score_review::utils::logging;
use essay_score_review::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    let _batch = App::initialize(config).await?.run().await?;

    Ok(())
}
