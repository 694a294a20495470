mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use common::{Entry, bundle, files, tree};
use sitedrop::{ExtractError, Layout, Site};

fn leftovers(site: &Site) -> Vec<String> {
    fs::read_dir(site.root().parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with('.'))
        .collect()
}

#[tokio::test]
async fn deploy_publishes_bundle() {
    let tmp = tempfile::tempdir().unwrap();
    let site = Site::open(tmp.path().join("www").join("site"), Layout::default()).unwrap();
    let archive = bundle(tmp.path(), "b.zip", &[
        Entry::File("dist/index.html", b"hello"),
        Entry::File("dist/assets/app.js", b"x"),
    ]);

    let report = site.deploy(&archive).await.unwrap();

    assert_eq!(report.files, 2);
    assert_eq!(tree(site.root()), files(&[("index.html", "hello"), ("assets/app.js", "x")]));
    assert!(site.is_deployed().await);
    assert!(leftovers(&site).is_empty(), "{:?}", leftovers(&site));
    assert!(archive.exists());
}

#[tokio::test]
async fn redeploying_the_same_bundle_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let site = Site::open(tmp.path().join("site"), Layout::default()).unwrap();
    let archive = bundle(tmp.path(), "b.zip", &[
        Entry::File("dist/index.html", b"hello"),
        Entry::File("dist/a/b/c.txt", b"deep"),
    ]);

    site.deploy(&archive).await.unwrap();
    let first = tree(site.root());
    site.deploy(&archive).await.unwrap();

    assert_eq!(tree(site.root()), first);
}

#[tokio::test]
async fn new_deploy_replaces_every_old_file() {
    let tmp = tempfile::tempdir().unwrap();
    let site = Site::open(tmp.path().join("site"), Layout::default()).unwrap();
    fs::write(site.root().join("stale.html"), "from before").unwrap();

    let v1 = bundle(tmp.path(), "v1.zip", &[
        Entry::File("dist/index.html", b"v1"),
        Entry::File("dist/old-route.html", b"gone soon"),
    ]);
    let v2 = bundle(tmp.path(), "v2.zip", &[Entry::File("dist/index.html", b"v2")]);

    site.deploy(&v1).await.unwrap();
    site.deploy(&v2).await.unwrap();

    assert_eq!(tree(site.root()), files(&[("index.html", "v2")]));
}

#[tokio::test]
async fn failed_deploy_leaves_live_site_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let site = Site::open(tmp.path().join("site"), Layout::default()).unwrap();
    let good = bundle(tmp.path(), "good.zip", &[Entry::File("dist/index.html", b"live")]);
    site.deploy(&good).await.unwrap();
    let before = tree(site.root());

    let missing = bundle(tmp.path(), "missing.zip", &[Entry::File("readme.txt", b"no dist")]);
    let err = site.deploy(&missing).await.unwrap_err();
    assert!(matches!(err, ExtractError::RequiredContentMissing { .. }));

    // Fails after writing one file into staging.
    let evil = bundle(tmp.path(), "evil.zip", &[
        Entry::File("dist/index.html", b"defaced"),
        Entry::File("dist/../../../escape.txt", b"x"),
    ]);
    let err = site.deploy(&evil).await.unwrap_err();
    assert!(matches!(err, ExtractError::PathTraversal { .. }));

    let garbage = tmp.path().join("garbage.zip");
    fs::write(&garbage, b"not a zip at all").unwrap();
    let err = site.deploy(&garbage).await.unwrap_err();
    assert!(matches!(err, ExtractError::ArchiveUnreadable { .. }));

    assert_eq!(tree(site.root()), before);
    assert!(!tmp.path().join("escape.txt").exists());
    assert!(leftovers(&site).is_empty(), "{:?}", leftovers(&site));
}

#[tokio::test]
async fn concurrent_deploys_end_with_one_complete_bundle() {
    let tmp = tempfile::tempdir().unwrap();
    let site = Arc::new(Site::open(tmp.path().join("site"), Layout::default()).unwrap());

    let mut archives = Vec::new();
    for n in 0..8 {
        let index = format!("build {n}");
        let page = format!("page {n}");
        let path = bundle(tmp.path(), &format!("b{n}.zip"), &[
            Entry::File("dist/index.html", index.as_bytes()),
            Entry::File(&format!("dist/only-in-{n}.html"), page.as_bytes()),
        ]);
        archives.push(path);
    }

    let mut tasks = tokio::task::JoinSet::new();
    for archive in archives {
        let site = Arc::clone(&site);
        tasks.spawn(async move { site.deploy(&archive).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let live = tree(site.root());
    assert_eq!(live.len(), 2, "{:?}", live.keys());
    let index = String::from_utf8(live["index.html"].clone()).unwrap();
    let n = index.strip_prefix("build ").unwrap();
    assert_eq!(live[&format!("only-in-{n}.html")], format!("page {n}").into_bytes());
    assert!(leftovers(&site).is_empty(), "{:?}", leftovers(&site));
}

#[tokio::test]
async fn layout_comes_from_the_site() {
    let tmp = tempfile::tempdir().unwrap();
    let site = Site::open(tmp.path().join("site"), "prefix:public".parse().unwrap()).unwrap();
    let archive = bundle(tmp.path(), "b.zip", &[
        Entry::File("dist/index.html", b"wrong"),
        Entry::File("public/index.html", b"right"),
    ]);

    site.deploy(&archive).await.unwrap();
    assert_eq!(tree(site.root()), files(&[("index.html", "right")]));
}

/// Incompressible filler, so the bundle takes a while to unpack.
fn noise(len: usize, mut seed: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        out.extend_from_slice(&seed.to_le_bytes());
    }
    out.truncate(len);
    out
}

#[tokio::test]
async fn abandoned_deploy_still_holds_the_lock() {
    let tmp = tempfile::tempdir().unwrap();
    let site = Site::open(tmp.path().join("site"), Layout::default()).unwrap();

    let blobs: Vec<(String, Vec<u8>)> = (0..40)
        .map(|n| (format!("dist/blob-{n}.bin"), noise(1024 * 1024, n + 1)))
        .collect();
    let mut entries = vec![Entry::File("dist/index.html", b"abandoned upload")];
    entries.extend(blobs.iter().map(|(name, bytes)| Entry::File(name.as_str(), bytes.as_slice())));
    let slow = bundle(tmp.path(), "slow.zip", &entries);
    let fast = bundle(tmp.path(), "fast.zip", &[Entry::File("dist/index.html", b"later upload")]);

    // The caller gives up while the slow bundle is being unpacked.
    let _ = tokio::time::timeout(Duration::from_millis(20), site.deploy(&slow)).await;

    // Queues behind the abandoned deployment instead of racing it.
    site.deploy(&fast).await.unwrap();

    assert_eq!(tree(site.root()), files(&[("index.html", "later upload")]));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(tree(site.root()), files(&[("index.html", "later upload")]));
    assert!(leftovers(&site).is_empty(), "{:?}", leftovers(&site));
}
