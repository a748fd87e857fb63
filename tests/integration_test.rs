//! 需要真实浏览器和京东账号的测试
//!
//! 默认忽略，需要手动运行：cargo test -- --ignored

use jd_invoice_fetcher::browser::{connect_to_browser, launch_browser, LaunchOptions};
use jd_invoice_fetcher::config::Config;
use jd_invoice_fetcher::logger;
use jd_invoice_fetcher::portal::{ChromePortal, InvoicePortal};
use jd_invoice_fetcher::services::{Pacer, SessionManager};

async fn open_portal(config: &Config) -> ChromePortal {
    let (browser, page) = match config.browser_debug_port {
        Some(port) => connect_to_browser(port).await.expect("连接浏览器失败"),
        None => launch_browser(&LaunchOptions::from_config(config))
            .await
            .expect("启动浏览器失败"),
    };
    ChromePortal::new(browser, page, config, Pacer::default())
}

#[tokio::test]
#[ignore]
async fn test_browser_launch() {
    logger::init();

    let config = Config::from_env();
    let portal = open_portal(&config).await;

    let url = portal.current_url().await.expect("读取地址失败");
    println!("当前地址: {}", url);
}

#[tokio::test]
#[ignore]
async fn test_login_and_read_first_page() {
    logger::init();

    let config = Config {
        headless: false,
        ..Config::from_env()
    };
    let portal = open_portal(&config).await;

    let session = SessionManager::new(&config)
        .establish(&portal)
        .await
        .expect("登录失败");
    assert!(session.authenticated);

    let rows = portal.read_rows().await.expect("读取订单失败");
    println!("第一页共 {} 个订单", rows.len());
    for row in &rows {
        println!("{} {} {:?}", row.order_id, row.status_text, row.action_label);
    }
}
