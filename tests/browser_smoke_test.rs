//! 浏览器冒烟测试
//!
//! 需要一个带 --remote-debugging-port 的浏览器和已登录的目标系统，
//! 默认忽略，手动运行：cargo test -- --ignored

use case_invoice_submit::browser::{connect_to_browser_and_page, CdpSessionFactory};
use case_invoice_submit::config::Config;
use case_invoice_submit::infrastructure::{PageReader, SessionFactory};
use case_invoice_submit::utils::logging;

#[tokio::test]
#[ignore]
async fn test_browser_connection() {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 测试浏览器连接
    let result = connect_to_browser_and_page(config.browser_debug_port, &config.target_url).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_session_open_renders_list() {
    logging::init();

    let config = Config::from_env();
    let factory = CdpSessionFactory::new(config);

    // 打开会话并等待列表渲染
    let reader = factory.open().await.expect("打开会话失败");
    let window = reader
        .pager_window()
        .await
        .expect("读取分页指示失败")
        .expect("列表应已渲染");

    println!("分页窗口: {}", window);
    assert!(window.is_valid());
}
