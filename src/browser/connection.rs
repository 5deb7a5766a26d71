use anyhow::Result;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 连接到浏览器并获取案件列表页
///
/// 优先复用已打开的列表标签页（按 URL 前缀匹配），
/// 找不到时新建页面并导航过去。登录态由浏览器侧维持。
pub async fn connect_to_browser_and_page(port: u16, target_url: &str) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    // 按 URL 前缀查找已打开的列表页（忽略 hash 之后的部分）
    let url_prefix = target_url.split('#').next().unwrap_or(target_url);
    for p in pages.iter() {
        let page_url = match p.evaluate("location.href").await {
            Ok(result) => result
                .into_value::<String>()
                .unwrap_or_default(),
            Err(_) => continue,
        };
        debug!("检查页面 URL: {}", page_url);
        if page_url.starts_with(url_prefix) {
            info!("✓ 复用已打开的页面: {}", page_url);
            return Ok((browser, p.clone()));
        }
    }

    // 没有找到则新建页面并导航
    debug!("未找到已打开的列表页，创建新页面");
    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        e
    })?;
    page.goto(target_url).await.map_err(|e| {
        error!("导航到 {} 失败: {}", target_url, e);
        e
    })?;
    info!("已导航到: {}", target_url);

    Ok((browser, page))
}
