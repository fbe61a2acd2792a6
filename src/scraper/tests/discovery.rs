use super::*;
use crate::types::CollectionPolicy;

#[tokio::test]
async fn test_limit_three_writes_three_files() {
    let temp_dir = TempDir::new().unwrap();
    let posts = (0..5)
        .map(|i| image_post("pics", &format!("t3_{}", i), &format!("picture {}", i)))
        .collect();
    let source = Arc::new(FakeSource::new().with_posts("pics", posts));
    let scraper = create_test_scraper(source, StoreResolver::new());

    let mut job = Job::new("pics", vec![file_destination(temp_dir.path())]);
    job.options.limit = 3;
    let id = scraper.submit_job(job).await.unwrap();

    let status = run_to_completion(&scraper, id).await;
    assert_eq!(status.total_items, 3);
    assert_eq!(status.items_done, 3);
    assert_eq!(status.written, 3);
    assert_eq!(count_files(&temp_dir.path().join("pics")), 3);
    assert!(temp_dir.path().join("pics").join("picture_0_t3_0.png").is_file());
}

#[tokio::test]
async fn test_zero_items_completes_immediately() {
    let temp_dir = TempDir::new().unwrap();
    let scraper = create_test_scraper(Arc::new(FakeSource::new()), StoreResolver::new());

    let id = scraper
        .submit_job(Job::new("empty", vec![file_destination(temp_dir.path())]))
        .await
        .unwrap();

    let start = std::time::Instant::now();
    assert!(scraper.wait_on_task(id, Duration::from_secs(5)).await.unwrap());
    assert!(start.elapsed() < Duration::from_secs(1));

    let status = scraper.check_status(id).await.unwrap();
    assert_eq!(status.total_items, 0);
    assert_eq!(status.items_done, 0);
    assert_eq!(status.phase, Phase::Completed);
    assert!(status.discovery_finished);
}

#[tokio::test]
async fn test_source_failure_abandons_only_that_account() {
    let temp_dir = TempDir::new().unwrap();
    let source = Arc::new(
        FakeSource::new()
            .failing_account("banned")
            .with_posts("pics", vec![image_post("pics", "a", "first")]),
    );
    let scraper = create_test_scraper(source, StoreResolver::new());
    let mut events = scraper.subscribe();

    let failed = scraper
        .submit_job(Job::new("banned", vec![file_destination(temp_dir.path())]))
        .await
        .unwrap();
    let healthy = scraper
        .submit_job(Job::new("pics", vec![file_destination(temp_dir.path())]))
        .await
        .unwrap();

    let status = run_to_completion(&scraper, failed).await;
    assert_eq!(status.total_items, 0);
    assert_eq!(status.phase, Phase::Completed);

    let status = run_to_completion(&scraper, healthy).await;
    assert_eq!(status.total_items, 1);
    assert_eq!(status.written, 1);

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if let Event::DiscoveryFailed { id, source_account, error } = event {
            assert_eq!(id, failed);
            assert_eq!(source_account, "banned");
            assert!(error.contains("banned"));
            saw_failure = true;
        }
    }
    assert!(saw_failure, "DiscoveryFailed should be emitted");
}

#[tokio::test]
async fn test_panicking_stream_still_completes_task() {
    let temp_dir = TempDir::new().unwrap();
    let posts = vec![
        image_post("pics", "a", "first"),
        image_post("pics", "b", "second"),
    ];
    let source = Arc::new(
        FakeSource::new()
            .with_posts("pics", posts)
            .crashing_account("pics"),
    );
    let scraper = create_test_scraper(source, StoreResolver::new());

    let id = scraper
        .submit_job(Job::new("pics", vec![file_destination(temp_dir.path())]))
        .await
        .unwrap();

    // Items yielded before the panic are still delivered
    let status = run_to_completion(&scraper, id).await;
    assert!(status.discovery_finished);
    assert_eq!(status.total_items, 2);
    assert_eq!(status.items_done, 2);
    assert_eq!(status.written, 2);

    // The worker survives and keeps serving jobs
    let id = scraper
        .submit_job(Job::new("empty", vec![file_destination(temp_dir.path())]))
        .await
        .unwrap();
    assert_eq!(run_to_completion(&scraper, id).await.phase, Phase::Completed);
}

#[tokio::test]
async fn test_skip_videos_drops_video_posts() {
    let temp_dir = TempDir::new().unwrap();
    let posts = vec![
        post_of_kind("pics", "img", MediaKind::Image),
        post_of_kind("pics", "vid", MediaKind::Video),
    ];
    let source = Arc::new(FakeSource::new().with_posts("pics", posts));
    let scraper = create_test_scraper(source.clone(), StoreResolver::new());

    let mut job = Job::new("pics", vec![file_destination(temp_dir.path())]);
    job.options.skip_videos = true;
    let id = scraper.submit_job(job).await.unwrap();

    let status = run_to_completion(&scraper, id).await;
    assert_eq!(status.total_items, 1);
    assert_eq!(status.items_done, 1);
    assert_eq!(source.downloads.load(Ordering::SeqCst), 1);

    let task = scraper.get_task(id).await.unwrap();
    assert_eq!(task.items[0].kind, MediaKind::Image);
    assert_eq!(task.items[0].ext, "jpg", "link without extension falls back to the kind default");
}

#[tokio::test]
async fn test_collection_first_only_keeps_one_entry() {
    let temp_dir = TempDir::new().unwrap();
    let gallery = vec![
        image_post("pics", "g1", "gallery one"),
        image_post("pics", "g1", "gallery two"),
        image_post("pics", "g1", "gallery three"),
    ];
    let source = Arc::new(FakeSource::new().with_posts("pics", gallery));
    let scraper = create_test_scraper(source, StoreResolver::new());

    let id = scraper
        .submit_job(Job::new("pics", vec![file_destination(temp_dir.path())]))
        .await
        .unwrap();
    assert_eq!(run_to_completion(&scraper, id).await.total_items, 1);

    let mut job = Job::new("pics", vec![file_destination(temp_dir.path())]);
    job.options.collection = CollectionPolicy::All;
    let id = scraper.submit_job(job).await.unwrap();

    let status = run_to_completion(&scraper, id).await;
    assert_eq!(status.total_items, 3);
    // The first entry was delivered by the previous task
    assert_eq!(status.skipped, 1);
    assert_eq!(status.written, 2);
    assert_eq!(count_files(temp_dir.path()), 3);
}

#[tokio::test]
async fn test_title_filters_drop_posts() {
    let temp_dir = TempDir::new().unwrap();
    let posts = vec![
        image_post("pics", "a", "Cat on a mat"),
        image_post("pics", "b", "Dog in fog"),
        image_post("pics", "c", "Cat, blurry"),
    ];
    let source = Arc::new(FakeSource::new().with_posts("pics", posts));
    let scraper = create_test_scraper(source, StoreResolver::new());

    let mut job = Job::new("pics", vec![file_destination(temp_dir.path())]);
    job.options.filter.include = vec!["^Cat".to_string()];
    job.options.filter.exclude = vec!["blurry".to_string()];
    let id = scraper.submit_job(job).await.unwrap();

    let status = run_to_completion(&scraper, id).await;
    assert_eq!(status.total_items, 1);

    let task = scraper.get_task(id).await.unwrap();
    assert_eq!(task.items[0].id, "a");
}

#[tokio::test]
async fn test_more_accounts_than_workers() {
    let temp_dir = TempDir::new().unwrap();
    let accounts: Vec<String> = (0..6).map(|i| format!("sub{}", i)).collect();
    let mut source = FakeSource::new();
    for account in &accounts {
        let posts = (0..4)
            .map(|i| image_post(account, &format!("{}_{}", account, i), "pic"))
            .collect();
        source = source.with_posts(account, posts);
    }
    let scraper = create_test_scraper(Arc::new(source), StoreResolver::new());

    let mut ids = Vec::new();
    for account in &accounts {
        let job = Job::new(account.clone(), vec![file_destination(temp_dir.path())]);
        ids.push(scraper.submit_job(job).await.unwrap());
    }

    for id in ids {
        let status = run_to_completion(&scraper, id).await;
        assert_eq!(status.total_items, 4);
        assert_eq!(status.items_done, 4);
    }
    assert_eq!(count_files(temp_dir.path()), 24);
}
