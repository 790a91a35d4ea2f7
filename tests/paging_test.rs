use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

use sposhcli::paging::{NullPolicy, Page, PageCursor, PageLoader, aggregate};
use sposhcli::requests::RequestError;

// Loader over a fixed dataset, counting page loads
fn loader_over(data: Vec<Option<u32>>, loads: Arc<AtomicU32>) -> PageLoader<u32> {
    Arc::new(move |offset, limit| {
        let data = data.clone();
        let loads = Arc::clone(&loads);
        Box::pin(async move {
            loads.fetch_add(1, Ordering::SeqCst);
            let total = data.len() as u32;
            let start = (offset as usize).min(data.len());
            let end = (start + limit as usize).min(data.len());
            Ok(Page {
                items: data[start..end].to_vec(),
                total,
                offset,
                limit,
                has_next: end < data.len(),
            })
        })
    })
}

fn values(range: std::ops::Range<u32>) -> Vec<Option<u32>> {
    range.map(Some).collect()
}

#[tokio::test]
async fn test_aggregate_exactness_and_minimal_loads() {
    let loads = Arc::new(AtomicU32::new(0));
    let loader = loader_over(values(0..120), Arc::clone(&loads));

    let result = aggregate(PageCursor::at(loader, 0, 50), 100, NullPolicy::Deny)
        .await
        .unwrap();

    assert_eq!(result.len(), 100);
    assert_eq!(result, (0..100).collect::<Vec<_>>());
    // 100 items fit in two 50-item pages; a third load would be wasted
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_aggregate_clamps_to_remote_total() {
    let loads = Arc::new(AtomicU32::new(0));
    let loader = loader_over(values(0..120), Arc::clone(&loads));

    let result = aggregate(PageCursor::at(loader, 0, 50), 10_000, NullPolicy::Deny)
        .await
        .unwrap();

    assert_eq!(result.len(), 120);
    assert_eq!(loads.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_aggregate_single_page_when_limit_is_small() {
    let loads = Arc::new(AtomicU32::new(0));
    let loader = loader_over(values(0..120), Arc::clone(&loads));

    let result = aggregate(PageCursor::at(loader, 0, 50), 10, NullPolicy::Deny)
        .await
        .unwrap();

    assert_eq!(result, (0..10).collect::<Vec<_>>());
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_aggregate_empty_listing() {
    let loads = Arc::new(AtomicU32::new(0));
    let loader = loader_over(Vec::new(), Arc::clone(&loads));

    let result = aggregate(PageCursor::at(loader, 0, 50), 100, NullPolicy::Deny)
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_null_placeholders_are_fatal_by_default_policy() {
    let mut data = values(0..10);
    data[4] = None;
    let loader = loader_over(data, Arc::new(AtomicU32::new(0)));

    let result = aggregate(PageCursor::at(loader, 0, 50), 100, NullPolicy::Deny).await;

    assert!(matches!(result, Err(RequestError::Fatal(_))));
}

#[tokio::test]
async fn test_null_placeholders_filtered_when_allowed() {
    let mut data = values(0..10);
    data[2] = None;
    data[7] = None;
    let loader = loader_over(data, Arc::new(AtomicU32::new(0)));

    let result = aggregate(PageCursor::at(loader, 0, 4), 100, NullPolicy::Allow)
        .await
        .unwrap();

    assert_eq!(result, vec![0, 1, 3, 4, 5, 6, 8, 9]);
}

#[tokio::test]
async fn test_pages_follow_in_order() {
    let loads = Arc::new(AtomicU32::new(0));
    let loader = loader_over(values(0..17), Arc::clone(&loads));

    let result = aggregate(PageCursor::at(loader, 0, 5), 17, NullPolicy::Deny)
        .await
        .unwrap();

    assert_eq!(result, (0..17).collect::<Vec<_>>());
    assert_eq!(loads.load(Ordering::SeqCst), 4);
}
