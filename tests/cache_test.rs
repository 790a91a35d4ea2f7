use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use sposhcli::cache::{CacheInvalidation, CacheLoader, ExpiringCache};

// Loader that returns 1, 2, 3, ... and counts its invocations
fn counting_loader(counter: Arc<AtomicU32>) -> CacheLoader<u32> {
    Box::new(move || {
        let counter = Arc::clone(&counter);
        Box::pin(async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) })
    })
}

fn list_loader(counter: Arc<AtomicU32>, values: Vec<Vec<u32>>) -> CacheLoader<Vec<u32>> {
    Box::new(move || {
        let counter = Arc::clone(&counter);
        let values = values.clone();
        Box::pin(async move {
            let call = counter.fetch_add(1, Ordering::SeqCst) as usize;
            Ok(values[call.min(values.len() - 1)].clone())
        })
    })
}

#[tokio::test]
async fn test_laziness() {
    let loads = Arc::new(AtomicU32::new(0));
    let cache = ExpiringCache::new(counting_loader(Arc::clone(&loads)));

    assert_eq!(loads.load(Ordering::SeqCst), 0);
    cache.get_data(false).await.unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_data_memoizes() {
    let loads = Arc::new(AtomicU32::new(0));
    let cache = ExpiringCache::new(counting_loader(Arc::clone(&loads)));

    assert_eq!(cache.get_data(false).await.unwrap(), 1);
    assert_eq!(cache.get_data(false).await.unwrap(), 1);
    assert_eq!(cache.get_data(true).await.unwrap(), 2);
    assert_eq!(cache.get_data(false).await.unwrap(), 2);
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_set_data() {
    let loads = Arc::new(AtomicU32::new(0));
    let cache = ExpiringCache::new(counting_loader(Arc::clone(&loads)));

    cache.set_data(59).await;
    assert_eq!(cache.get_data(false).await.unwrap(), 59);
    assert_eq!(cache.get_data(false).await.unwrap(), 59);
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalidate_forces_reload() {
    let loads = Arc::new(AtomicU32::new(0));
    let cache = ExpiringCache::new(counting_loader(Arc::clone(&loads)));

    assert_eq!(cache.get_data(false).await.unwrap(), 1);
    cache.invalidate().await;
    assert_eq!(cache.get_data(false).await.unwrap(), 2);
    assert_eq!(cache.get_data(false).await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_validity_window_expires() {
    let loads = Arc::new(AtomicU32::new(0));
    let cache = ExpiringCache::with_validity(
        counting_loader(Arc::clone(&loads)),
        Duration::from_millis(5),
    );

    assert_eq!(cache.get_data(false).await.unwrap(), 1);
    assert_eq!(cache.get_data(false).await.unwrap(), 1);

    tokio::time::advance(Duration::from_millis(6)).await;
    assert_eq!(cache.get_data(false).await.unwrap(), 2);
    assert_eq!(loads.load(Ordering::SeqCst), 2);

    tokio::time::advance(Duration::from_millis(6)).await;
    assert_eq!(cache.get_data(false).await.unwrap(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_validate_for_at_least_only_extends() {
    let loads = Arc::new(AtomicU32::new(0));
    let cache = ExpiringCache::with_validity(
        counting_loader(Arc::clone(&loads)),
        Duration::from_millis(5),
    );

    assert_eq!(cache.get_data(false).await.unwrap(), 1);
    cache.validate_for_at_least(Duration::from_secs(60)).await;

    // well past the configured window, but inside the extension
    tokio::time::advance(Duration::from_millis(50)).await;
    assert_eq!(cache.get_data(false).await.unwrap(), 1);
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    // a shorter validation must not cut the extension short
    cache.validate_for_at_least(Duration::from_millis(1)).await;
    tokio::time::advance(Duration::from_millis(10)).await;
    assert_eq!(cache.get_data(false).await.unwrap(), 1);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalidation_cascades_to_dependents() {
    let parent_loads = Arc::new(AtomicU32::new(0));
    let parent = ExpiringCache::new(counting_loader(Arc::clone(&parent_loads)));

    let child_loads = Arc::new(AtomicU32::new(0));
    let child = Arc::new(ExpiringCache::new(counting_loader(Arc::clone(
        &child_loads,
    ))));
    parent.add_dependent(Arc::clone(&child) as Arc<dyn CacheInvalidation>);

    assert_eq!(parent.get_data(false).await.unwrap(), 1);
    assert_eq!(child.get_data(false).await.unwrap(), 1);

    parent.invalidate().await;

    assert_eq!(parent.get_data(false).await.unwrap(), 2);
    assert_eq!(child.get_data(false).await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_validation_cascades_to_dependents() {
    let parent = ExpiringCache::with_validity(
        counting_loader(Arc::new(AtomicU32::new(0))),
        Duration::from_millis(5),
    );
    let child_loads = Arc::new(AtomicU32::new(0));
    let child = Arc::new(ExpiringCache::with_validity(
        counting_loader(Arc::clone(&child_loads)),
        Duration::from_millis(5),
    ));
    parent.add_dependent(Arc::clone(&child) as Arc<dyn CacheInvalidation>);

    assert_eq!(child.get_data(false).await.unwrap(), 1);
    parent.validate_for_at_least(Duration::from_secs(60)).await;

    tokio::time::advance(Duration::from_millis(50)).await;
    assert_eq!(child.get_data(false).await.unwrap(), 1);
    assert_eq!(child_loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stale_when_reloads_empty_values() {
    let loads = Arc::new(AtomicU32::new(0));
    let cache = ExpiringCache::new(list_loader(
        Arc::clone(&loads),
        vec![vec![], vec![7, 8], vec![9]],
    ))
    .stale_when(|values: &Vec<u32>| values.is_empty());

    // an empty load is returned but not trusted
    assert_eq!(cache.get_data(false).await.unwrap(), Vec::<u32>::new());
    assert_eq!(cache.get_data(false).await.unwrap(), vec![7, 8]);
    // a non-empty value sticks
    assert_eq!(cache.get_data(false).await.unwrap(), vec![7, 8]);
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}
