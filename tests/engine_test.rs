//! 引擎整体行为测试（内存 mock，无需浏览器）
//!
//! 覆盖的性质：
//! - 幂等：同一 (记录, 期间, 金额) 至多一次有效提交
//! - 锚点：条目处理完后分页窗口回到访问前的锚点
//! - 定位确定性：跨页扫描总是从第一页开始、页数有界
//! - 终态错误不消耗重试预算；重试/重启预算有界
//! - 停止协作式生效；跳过集是中性的

mod common;

use case_invoice_submit::api::{dispatch, Command};
use case_invoice_submit::control::{PollPolicy, RunControl};
use case_invoice_submit::infrastructure::SessionFactory;
use case_invoice_submit::models::{CaseStatus, ExistingEntry, StageStatus};
use case_invoice_submit::orchestrator::{event_channel, RunOrchestrator};
use case_invoice_submit::services::{ItemLocator, Pager};
use common::{date, fast_config, fast_run_config, MockSessionFactory, MockState};
use std::sync::Arc;

fn orchestrator_with(
    factory: Arc<MockSessionFactory>,
    run_config: case_invoice_submit::RunConfig,
) -> RunOrchestrator {
    let (events, _rx) = event_channel();
    RunOrchestrator::new(fast_config(), run_config, factory, events)
}

// ========== 幂等 ==========

#[tokio::test]
async fn exact_duplicate_short_circuits_submission() {
    let mut state = MockState::new(&["Albrecht, Paul"], 10);
    // 远程已有完全一致的记录：钳制后 [01-10, 01-20]，11 天 × 48 = 528
    state.entries.insert(
        "Albrecht, Paul".to_string(),
        vec![ExistingEntry {
            start: date(2024, 1, 10),
            end: date(2024, 1, 20),
            amount_cents: 528,
        }],
    );
    let factory = MockSessionFactory::new(state);
    let orchestrator = orchestrator_with(factory.clone(), fast_run_config());

    orchestrator.run(0).await.unwrap();

    let queue = orchestrator.get_state().queue;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].status, CaseStatus::Ok);
    assert_eq!(queue[0].billing_status, StageStatus::Duplicate);
    // 无任何提交副作用
    factory.with_state(|s| assert!(s.submissions.is_empty()));
}

#[tokio::test]
async fn second_visit_of_same_record_is_duplicate() {
    let factory = MockSessionFactory::new(MockState::new(&["Albrecht, Paul"], 10));
    let orchestrator = orchestrator_with(factory.clone(), fast_run_config());

    let first = orchestrator
        .visit_one("k1", "Albrecht, Paul")
        .await
        .unwrap();
    assert_eq!(first.status, CaseStatus::Ok);
    assert_eq!(first.billing_status, StageStatus::Done);

    let second = orchestrator
        .visit_one("k1", "Albrecht, Paul")
        .await
        .unwrap();
    assert_eq!(second.status, CaseStatus::Ok);
    assert_eq!(second.billing_status, StageStatus::Duplicate);

    // 两次访问，只有一次提交
    factory.with_state(|s| assert_eq!(s.submissions.len(), 1));
}

// ========== 定位 + 锚点 ==========

#[tokio::test]
async fn visit_relocates_across_pages_and_restores_anchor() {
    let names = ["Albrecht, Paul", "Bernhard, Klara", "Cramer, Ida", "Dietrich, Max", "Ewald, Ruth"];
    let factory = MockSessionFactory::new(MockState::new(&names, 2));
    let orchestrator = orchestrator_with(factory.clone(), fast_run_config());

    // "Cramer, Ida" 在第 2 页（窗口 3–4 / 5）
    let item = orchestrator.visit_one("k3", "Cramer, Ida").await.unwrap();

    assert_eq!(item.status, CaseStatus::Ok);
    let anchor = item.page_anchor.expect("定位成功后必有锚点");
    assert_eq!((anchor.start, anchor.end, anchor.total), (3, 4, 5));

    // 访问结束后分页窗口回到锚点
    factory.with_state(|s| {
        assert_eq!(s.current_page, 2);
        assert!(s.detail_open.is_none());
        assert_eq!(s.submissions.len(), 1);
    });
}

#[tokio::test]
async fn locator_scans_forward_from_page_one() {
    let names = [
        "Albrecht", "Bernhard", "Clemens", "Dora", "Emil", "Frieda", "Georg", "Hanna", "Ilse",
        "Jakob",
    ];
    let factory = MockSessionFactory::new(MockState::new(&names, 2));
    // 当前停在第 4 页；目标在第 3 页
    factory.with_state(|s| s.current_page = 4);
    let reader = factory.open().await.unwrap();
    let control = RunControl::new();
    let pager = Pager::new(reader.as_ref(), &control, PollPolicy::new(3, 1));
    let locator = ItemLocator::new(reader.as_ref(), &control, PollPolicy::new(2, 1));

    let (row, window) = locator
        .find_across_all_pages(&pager, "Emil")
        .await
        .unwrap()
        .expect("记录应能找到");

    assert_eq!(row.name, "Emil");
    assert_eq!(window.start, 5);

    factory.with_state(|s| {
        // 扫描从第一页开始，单调向前，最多到找到的那页
        assert_eq!(*s.visible_rows_pages.first().unwrap(), 1);
        assert!(s.visible_rows_pages.windows(2).all(|w| w[0] <= w[1]));
        assert!(*s.visible_rows_pages.iter().max().unwrap() <= 3);
    });
}

#[tokio::test]
async fn locator_miss_is_bounded_and_restores_window() {
    let names = [
        "Albrecht", "Bernhard", "Clemens", "Dora", "Emil", "Frieda", "Georg", "Hanna", "Ilse",
        "Jakob",
    ];
    let factory = MockSessionFactory::new(MockState::new(&names, 2));
    factory.with_state(|s| s.current_page = 4);
    let reader = factory.open().await.unwrap();
    let control = RunControl::new();
    let pager = Pager::new(reader.as_ref(), &control, PollPolicy::new(3, 1));
    let locator = ItemLocator::new(reader.as_ref(), &control, PollPolicy::new(2, 1));

    let found = locator
        .find_across_all_pages(&pager, "Zacharias")
        .await
        .unwrap();
    assert!(found.is_none());

    factory.with_state(|s| {
        // 最多扫描 ceil(10/2) = 5 页
        assert!(*s.visible_rows_pages.iter().max().unwrap() <= 5);
        // 失败后恢复原窗口（第 4 页）
        assert_eq!(s.current_page, 4);
    });
}

// ========== 终态错误与重试预算 ==========

#[tokio::test]
async fn no_overlap_is_terminal_and_consumes_no_budget() {
    let mut state = MockState::new(&["Albrecht, Paul"], 10);
    state.auth_overrides.insert(
        "Albrecht, Paul".to_string(),
        case_invoice_submit::AuthorizationWindow {
            opened: date(2024, 3, 1),
            authorized_end: date(2024, 3, 31),
            max_amount_cents: 1_000_000,
        },
    );
    let factory = MockSessionFactory::new(state);
    let orchestrator = orchestrator_with(factory.clone(), fast_run_config());

    let item = orchestrator.visit_one("k1", "Albrecht, Paul").await.unwrap();

    assert_eq!(item.status, CaseStatus::Bad);
    assert_eq!(item.billing_status, StageStatus::Error);
    assert!(item.error.unwrap().contains("无交集"));
    // 终态错误：既不刷新也不重启
    assert_eq!(factory.opens(), 1);
    factory.with_state(|s| {
        assert_eq!(s.reload_count, 0);
        assert!(s.submissions.is_empty());
    });
}

#[tokio::test]
async fn retry_and_restart_budgets_are_bounded() {
    let mut state = MockState::new(&["Albrecht, Paul"], 10);
    state.fail_visible_rows = 1000;
    let factory = MockSessionFactory::new(state);
    let orchestrator = orchestrator_with(factory.clone(), fast_run_config());

    let item = orchestrator.visit_one("k1", "Albrecht, Paul").await.unwrap();

    // refresh_retry_limit = 3, session_restart_limit = 2
    assert_eq!(item.status, CaseStatus::Bad);
    assert!(item.error.unwrap().contains("ELEMENT_NOT_FOUND"));
    // 初始会话 + 两次重启
    assert_eq!(factory.opens(), 3);
    factory.with_state(|s| {
        // 每个会话内最多 refresh_limit 次尝试、其间 refresh_limit-1 次刷新
        assert_eq!(s.reload_count, 6);
    });
}

#[tokio::test]
async fn session_lost_escalates_to_restart_and_resumes() {
    let mut state = MockState::new(&["Albrecht, Paul"], 10);
    state.submit_session_lost = true;
    let factory = MockSessionFactory::new(state);
    let orchestrator = orchestrator_with(factory.clone(), fast_run_config());

    let item = orchestrator.visit_one("k1", "Albrecht, Paul").await.unwrap();

    // 第一次提交时会话断开 → 重启 → 同一条目重新处理 → 成功
    assert_eq!(item.status, CaseStatus::Ok);
    assert_eq!(item.billing_status, StageStatus::Done);
    assert_eq!(factory.opens(), 2);
    factory.with_state(|s| {
        assert_eq!(s.reload_count, 0);
        assert_eq!(s.submissions.len(), 1);
    });
}

#[tokio::test]
async fn verify_tolerates_delayed_rendering() {
    let mut state = MockState::new(&["Albrecht, Paul"], 10);
    state.delay_verify = 2;
    let factory = MockSessionFactory::new(state);
    let orchestrator = orchestrator_with(factory.clone(), fast_run_config());

    let item = orchestrator.visit_one("k1", "Albrecht, Paul").await.unwrap();

    assert_eq!(item.status, CaseStatus::Ok);
    factory.with_state(|s| assert_eq!(s.submissions.len(), 1));
}

// ========== 运行控制 ==========

#[tokio::test]
async fn stop_mid_run_lets_in_flight_item_finish() {
    let names = ["Albrecht, Paul", "Bernhard, Klara", "Cramer, Ida"];
    let factory = MockSessionFactory::new(MockState::new(&names, 10));
    let orchestrator = Arc::new(orchestrator_with(factory.clone(), fast_run_config()));

    // 第一次提交成功后立刻请求停止
    let control = orchestrator.control();
    factory.with_state(|s| {
        s.on_submit = Some(Box::new(move || control.request_stop()));
    });

    orchestrator.run(0).await.unwrap();

    let state = orchestrator.get_state();
    assert!(state.stopped);
    // 进行中的条目到达终态，后续条目不再开始
    assert_eq!(state.queue[0].status, CaseStatus::Ok);
    assert_eq!(state.queue[1].status, CaseStatus::Pending);
    assert_eq!(state.queue[2].status, CaseStatus::Pending);
    factory.with_state(|s| assert_eq!(s.submissions.len(), 1));
}

#[tokio::test]
async fn skip_set_is_neutral() {
    let names = ["Albrecht, Paul", "Bernhard, Klara", "Cramer, Ida"];
    let factory = MockSessionFactory::new(MockState::new(&names, 10));
    let mut run_config = fast_run_config();
    // key 按列表绝对位置生成
    run_config.skip_keys = vec!["0002-Bernhard, Klara".to_string()];
    let orchestrator = orchestrator_with(factory.clone(), run_config);

    orchestrator.run(0).await.unwrap();

    let queue = orchestrator.get_state().queue;
    assert_eq!(queue[0].status, CaseStatus::Ok);
    // 跳过的条目既不算成功也不算失败
    assert_eq!(queue[1].status, CaseStatus::Pending);
    assert!(queue[1].error.is_none());
    assert_eq!(queue[2].status, CaseStatus::Ok);
    factory.with_state(|s| assert_eq!(s.submissions.len(), 2));
}

// ========== 文书后端 ==========

#[tokio::test]
async fn document_backend_unreachable_is_retryable_error() {
    use case_invoice_submit::error::{classify, ErrorKind};
    use case_invoice_submit::models::{ContactInfo, DateRange};
    use case_invoice_submit::services::DocumentService;

    let service = DocumentService::new("http://127.0.0.1:9");
    let contact = ContactInfo {
        name: "Albrecht, Paul".to_string(),
        file_number: "AZ-1".to_string(),
        address: "Teststraße 1".to_string(),
        phone: None,
    };
    let range = DateRange::new(date(2024, 1, 10), date(2024, 1, 20));

    let err = service.generate(&contact, range).await.unwrap_err();
    // 连接被拒 → 网络类错误，可重试而非终态
    let kind = classify(&err);
    assert!(matches!(kind, ErrorKind::Network | ErrorKind::Timeout));
    assert!(!kind.is_terminal());
}

// ========== 命令接口 ==========

#[tokio::test]
async fn dispatch_commands() {
    let mut state = MockState::new(&["Albrecht, Paul"], 10);
    // ENTER_BILLING 作用于当前已打开的详情页
    state.detail_open = Some("Albrecht, Paul".to_string());
    let factory = MockSessionFactory::new(state);
    let orchestrator = Arc::new(orchestrator_with(factory.clone(), fast_run_config()));

    // 命令按 SCREAMING_SNAKE_CASE 标签反序列化
    let parsed: Command =
        serde_json::from_str(r#"{"command":"RUN_START","from_index":3}"#).unwrap();
    assert!(matches!(parsed, Command::RunStart { from_index: 3 }));

    let response = dispatch(
        orchestrator.clone(),
        Command::EnterBilling {
            start: date(2024, 1, 10),
            end: date(2024, 1, 20),
            rate_per_day_cents: 48,
            proof_reference: "NW-TEST".to_string(),
        },
    )
    .await;
    assert!(response.ok);
    assert_eq!(response.duplicate, Some(false));
    factory.with_state(|s| {
        assert_eq!(s.submissions.len(), 1);
        assert_eq!(s.submissions[0].1.amount_cents, 528);
        // 详情页回到列表后才能扫描
        s.detail_open = None;
    });

    let response = dispatch(orchestrator.clone(), Command::ScrapeList).await;
    assert!(response.ok);
    assert_eq!(response.items.unwrap().len(), 1);

    let response = dispatch(orchestrator.clone(), Command::RunStop).await;
    assert!(response.ok);
}

#[tokio::test]
async fn run_start_from_index_skips_earlier_items() {
    let names = ["Albrecht, Paul", "Bernhard, Klara", "Cramer, Ida"];
    let factory = MockSessionFactory::new(MockState::new(&names, 10));
    let orchestrator = orchestrator_with(factory.clone(), fast_run_config());

    orchestrator.run(1).await.unwrap();

    let queue = orchestrator.get_state().queue;
    assert_eq!(queue[0].status, CaseStatus::Pending);
    assert_eq!(queue[1].status, CaseStatus::Ok);
    assert_eq!(queue[2].status, CaseStatus::Ok);
}
