use super::*;

fn write_png(path: &Path, rgba: [u8; 4]) {
    let img = image::RgbaImage::from_raw(2, 1, [rgba, rgba].concat()).unwrap();
    img.save(path).unwrap();
}

#[test]
fn load_and_reload_decode_the_same_pixels() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("logo.png"), [255, 0, 0, 255]);

    let mut sources = BTreeMap::new();
    sources.insert("logo".to_string(), "./logo.png".to_string());
    let store = AssetStore::load(&sources, dir.path()).unwrap();
    let img = store.image("logo").unwrap();
    assert_eq!((img.width, img.height), (2, 1));
    assert_eq!(&img.rgba8_premul[..4], &[255, 0, 0, 255]);

    let again = store.reload().unwrap();
    assert_eq!(again.image("logo"), store.image("logo"));
    assert!(!Arc::ptr_eq(
        &again.image("logo").unwrap().rgba8_premul,
        &img.rgba8_premul
    ));
}

#[test]
fn missing_file_and_remote_urls_fail() {
    let dir = tempfile::tempdir().unwrap();
    let mut sources = BTreeMap::new();
    sources.insert("a".to_string(), "missing.png".to_string());
    assert!(AssetStore::load(&sources, dir.path()).is_err());

    let mut sources = BTreeMap::new();
    sources.insert("a".to_string(), "https://example.com/a.png".to_string());
    assert!(matches!(
        AssetStore::load(&sources, dir.path()),
        Err(TickreelError::Validation(_))
    ));
}

#[test]
fn normalize_rel_path_rules() {
    assert_eq!(normalize_rel_path("a/./b\\c.png").unwrap(), "a/b/c.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./").is_err());
}
