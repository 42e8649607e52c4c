use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};

use damage2yolo::{
    process_mask_dataset, process_polygon_dataset, ConversionConfig, ConvertError, Format,
};

const HOOD_JSON: &str = r#"{
    "size": {"width": 200, "height": 100},
    "objects": [
        {"classTitle": "Hood", "geometryType": "polygon",
         "points": {"exterior": [[10, 10], [110, 10], [110, 60], [10, 60]], "interior": []}}
    ]
}"#;

fn annotation_json(class_title: &str, offset: u32) -> String {
    format!(
        r#"{{"size": {{"width": 100, "height": 100}},
            "objects": [{{"classTitle": "{}", "geometryType": "polygon",
              "points": {{"exterior": [[{o}, {o}], [{e}, {o}], [{e}, {e}]]}}}}]}}"#,
        class_title,
        o = offset,
        e = offset + 20
    )
}

fn setup_polygon_dataset(root: &Path, count: usize) -> PathBuf {
    let dataset = root.join("dataset");
    fs::create_dir_all(dataset.join("ann")).unwrap();
    fs::create_dir_all(dataset.join("img")).unwrap();
    for i in 0..count {
        let class_title = if i % 2 == 0 { "Door" } else { "Bumper" };
        fs::write(
            dataset.join("ann").join(format!("car{:02}.jpg.json", i)),
            annotation_json(class_title, i as u32),
        )
        .unwrap();
        fs::write(
            dataset.join("img").join(format!("car{:02}.jpg", i)),
            format!("image {}", i),
        )
        .unwrap();
    }
    dataset
}

fn file_names(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

fn stems(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            entry
                .unwrap()
                .path()
                .file_stem()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

fn read_tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    for sub in ["images/train", "images/val", "labels/train", "labels/val"] {
        let dir = root.join(sub);
        for name in file_names(&dir) {
            files.push((format!("{}/{}", sub, name), fs::read(dir.join(&name)).unwrap()));
        }
    }
    files
}

#[test]
fn test_single_annotation_example() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dataset = temp_dir.path().join("dataset");
    fs::create_dir_all(dataset.join("ann")).unwrap();
    fs::create_dir_all(dataset.join("img")).unwrap();
    fs::write(dataset.join("ann/car1.jpg.json"), HOOD_JSON).unwrap();
    fs::write(dataset.join("img/car1.jpg"), b"jpeg bytes").unwrap();

    let output = temp_dir.path().join("out");
    let summary = process_polygon_dataset(&ConversionConfig::new(&dataset, &output)).unwrap();

    // floor(1 * 0.8) == 0, so the only image lands in val
    assert!(summary.written.train.is_empty());
    assert_eq!(summary.written.val, vec!["car1.jpg".to_string()]);
    assert_eq!(summary.class_names, vec!["Hood".to_string()]);

    let label = fs::read_to_string(output.join("labels/val/car1.txt")).unwrap();
    assert_eq!(label, "0 0.300000 0.350000 0.500000 0.500000");
    assert_eq!(fs::read(output.join("images/val/car1.jpg")).unwrap(), b"jpeg bytes");

    let yaml = fs::read_to_string(output.join("data.yaml")).unwrap();
    assert!(yaml.starts_with("path: "));
    assert!(yaml.contains("train: images/train\nval: images/val\nnc: 1\nnames:\n  - Hood\n"));
}

#[test]
fn test_split_and_pairing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dataset = setup_polygon_dataset(temp_dir.path(), 10);
    let output = temp_dir.path().join("out");

    let summary = process_polygon_dataset(&ConversionConfig::new(&dataset, &output)).unwrap();
    assert_eq!(summary.written.train.len(), 8);
    assert_eq!(summary.written.val.len(), 2);
    assert_eq!(summary.stats.written_images, 10);
    assert_eq!(summary.class_names, vec!["Bumper".to_string(), "Door".to_string()]);

    let train: BTreeSet<_> = summary.written.train.iter().collect();
    let val: BTreeSet<_> = summary.written.val.iter().collect();
    assert!(train.is_disjoint(&val));

    for split in ["train", "val"] {
        assert_eq!(
            stems(&output.join("images").join(split)),
            stems(&output.join("labels").join(split))
        );
    }

    // car00 is a Door (id 1), car01 a Bumper (id 0)
    for (id, class_id) in [("car00", "1"), ("car01", "0")] {
        let split = if summary.written.train.contains(&format!("{}.jpg", id)) {
            "train"
        } else {
            "val"
        };
        let label = fs::read_to_string(output.join("labels").join(split).join(format!("{}.txt", id)))
            .unwrap();
        assert!(label.starts_with(&format!("{} ", class_id)), "{}", label);
    }
}

#[test]
fn test_runs_are_deterministic() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dataset = setup_polygon_dataset(temp_dir.path(), 12);
    let first_out = temp_dir.path().join("first");
    let second_out = temp_dir.path().join("second");

    let first = process_polygon_dataset(&ConversionConfig::new(&dataset, &first_out)).unwrap();
    let second = process_polygon_dataset(&ConversionConfig::new(&dataset, &second_out)).unwrap();

    assert_eq!(first.written, second.written);
    assert_eq!(first.class_names, second.class_names);
    assert_eq!(read_tree(&first_out), read_tree(&second_out));
}

#[test]
fn test_rerun_is_idempotent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dataset = setup_polygon_dataset(temp_dir.path(), 6);
    let output = temp_dir.path().join("out");
    let config = ConversionConfig::new(&dataset, &output).with_format(Format::Polygon);

    process_polygon_dataset(&config).unwrap();
    let before = read_tree(&output);
    let summary = process_polygon_dataset(&config).unwrap();

    assert_eq!(summary.stats.written_images, 6);
    assert_eq!(read_tree(&output), before);
}

#[test]
fn test_missing_image_and_bad_annotation_are_skipped() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dataset = setup_polygon_dataset(temp_dir.path(), 4);
    fs::remove_file(dataset.join("img/car02.jpg")).unwrap();
    fs::write(dataset.join("ann/broken.jpg.json"), "{ not json").unwrap();

    let output = temp_dir.path().join("out");
    let mut config = ConversionConfig::new(&dataset, &output);
    config.split_ratio = 1.0;
    let summary = process_polygon_dataset(&config).unwrap();

    assert_eq!(summary.stats.total_items, 5);
    assert_eq!(summary.stats.skipped_missing_image, 1);
    assert_eq!(summary.stats.skipped_unreadable_annotation, 1);
    assert_eq!(summary.stats.written_images, 3);
    assert!(!output.join("labels/train/car02.txt").exists());
    assert_eq!(file_names(&output.join("labels/train")).len(), 3);
}

#[test]
fn test_label_list_restricts_classes() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dataset = setup_polygon_dataset(temp_dir.path(), 4);
    let output = temp_dir.path().join("out");
    let mut config = ConversionConfig::new(&dataset, &output);
    config.split_ratio = 1.0;
    config.label_list = vec!["Door".to_string()];

    let summary = process_polygon_dataset(&config).unwrap();
    assert_eq!(summary.class_names, vec!["Door".to_string()]);
    assert_eq!(summary.stats.dropped_objects, 2);
    // bumper images still get an empty label file
    assert_eq!(fs::read_to_string(output.join("labels/train/car01.txt")).unwrap(), "");
    assert!(fs::read_to_string(output.join("labels/train/car00.txt"))
        .unwrap()
        .starts_with("0 "));
}

#[test]
fn test_dotted_image_names_keep_their_own_labels() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dataset = temp_dir.path().join("dataset");
    fs::create_dir_all(dataset.join("ann")).unwrap();
    fs::create_dir_all(dataset.join("img")).unwrap();
    for (name, class_title) in [("car.v1.jpg", "Door"), ("car.v2.jpg", "Bumper")] {
        fs::write(
            dataset.join("ann").join(format!("{}.json", name)),
            annotation_json(class_title, 5),
        )
        .unwrap();
        fs::write(dataset.join("img").join(name), name).unwrap();
    }

    let output = temp_dir.path().join("out");
    let mut config = ConversionConfig::new(&dataset, &output);
    config.split_ratio = 1.0;
    let summary = process_polygon_dataset(&config).unwrap();

    assert_eq!(summary.stats.written_images, 2);
    assert_eq!(
        file_names(&output.join("labels/train")),
        BTreeSet::from(["car.v1.txt".to_string(), "car.v2.txt".to_string()])
    );
    assert_eq!(
        stems(&output.join("images/train")),
        stems(&output.join("labels/train"))
    );
    // Bumper sorts first, so the Door image carries class 1
    assert!(fs::read_to_string(output.join("labels/train/car.v1.txt"))
        .unwrap()
        .starts_with("1 "));
    assert!(fs::read_to_string(output.join("labels/train/car.v2.txt"))
        .unwrap()
        .starts_with("0 "));
}

#[test]
fn test_zero_size_image_fails_alone() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dataset = setup_polygon_dataset(temp_dir.path(), 1);
    fs::write(
        dataset.join("ann/flat.jpg.json"),
        r#"{"size": {"width": 0, "height": 100},
            "objects": [{"classTitle": "Door", "geometryType": "polygon",
              "points": {"exterior": [[1, 1], [20, 1], [20, 20]]}}]}"#,
    )
    .unwrap();
    fs::write(dataset.join("img/flat.jpg"), b"flat").unwrap();

    let output = temp_dir.path().join("out");
    let mut config = ConversionConfig::new(&dataset, &output);
    config.split_ratio = 1.0;
    let summary = process_polygon_dataset(&config).unwrap();

    assert_eq!(summary.stats.total_items, 2);
    assert_eq!(summary.stats.failed_images, 1);
    assert_eq!(summary.stats.written_images, 1);
    assert_eq!(summary.written.train, vec!["car00.jpg".to_string()]);
    assert!(!output.join("labels/train/flat.txt").exists());
    assert!(!output.join("images/train/flat.jpg").exists());
    assert!(output.join("labels/train/car00.txt").is_file());
    assert!(output.join("images/train/car00.jpg").is_file());
    assert!(output.join("data.yaml").is_file());
}

#[test]
fn test_missing_source_directory_is_fatal() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dataset = temp_dir.path().join("dataset");
    fs::create_dir_all(dataset.join("ann")).unwrap();
    let output = temp_dir.path().join("out");

    let result = process_polygon_dataset(&ConversionConfig::new(&dataset, &output));
    assert!(matches!(result, Err(ConvertError::MissingDirectory { kind: "Image", .. })));

    let result = process_mask_dataset(&ConversionConfig::new(&dataset, &output));
    assert!(matches!(result, Err(ConvertError::MissingDirectory { kind: "Mask", .. })));
    assert!(!output.exists());
}

fn setup_mask_dataset(root: &Path) -> PathBuf {
    let dataset = root.join("dataset");
    fs::create_dir_all(dataset.join("masks_human")).unwrap();
    fs::create_dir_all(dataset.join("img")).unwrap();
    dataset
}

fn save_mask(dataset: &Path, name: &str, rects: &[(u32, u32, u32, u32)]) {
    let mut mask = GrayImage::new(20, 20);
    for &(x0, y0, x1, y1) in rects {
        for y in y0..y1 {
            for x in x0..x1 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }
    mask.save(dataset.join("masks_human").join(format!("{}.png", name)))
        .unwrap();
}

#[test]
fn test_mask_pipeline() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dataset = setup_mask_dataset(temp_dir.path());
    save_mask(&dataset, "dent", &[(5, 5, 15, 15)]);
    save_mask(&dataset, "speck", &[(2, 2, 4, 4)]);
    fs::write(dataset.join("img/dent.jpg"), b"dent").unwrap();
    fs::write(dataset.join("img/speck.png"), b"speck").unwrap();

    let output = temp_dir.path().join("out");
    let mut config = ConversionConfig::new(&dataset, &output).with_format(Format::Polygon);
    config.split_ratio = 1.0;
    let summary = process_mask_dataset(&config).unwrap();

    assert_eq!(summary.class_names, vec!["damage".to_string()]);
    assert_eq!(summary.stats.written_images, 2);
    assert_eq!(summary.stats.filtered_regions, 1);

    let dent = fs::read_to_string(output.join("labels/train/dent.txt")).unwrap();
    let tokens: Vec<&str> = dent.split(' ').collect();
    assert_eq!(tokens.len(), 9, "{}", dent);
    assert_eq!(tokens[0], "0");
    assert!(tokens[1..]
        .iter()
        .all(|t| *t == "0.250000" || *t == "0.700000"));

    // a blob below the area threshold leaves an empty label, not a skip
    assert_eq!(fs::read_to_string(output.join("labels/train/speck.txt")).unwrap(), "");
    assert!(output.join("images/train/speck.png").exists());

    let yaml = fs::read_to_string(output.join("data.yaml")).unwrap();
    assert!(yaml.ends_with("nc: 1\nnames:\n  - damage\n"));
}

#[test]
fn test_mask_pipeline_bbox_format() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dataset = setup_mask_dataset(temp_dir.path());
    save_mask(&dataset, "dent", &[(5, 5, 15, 15)]);
    fs::write(dataset.join("img/dent.jpg"), b"dent").unwrap();

    let output = temp_dir.path().join("out");
    let mut config = ConversionConfig::new(&dataset, &output);
    config.split_ratio = 0.0;
    process_mask_dataset(&config).unwrap();

    let dent = fs::read_to_string(output.join("labels/val/dent.txt")).unwrap();
    assert_eq!(dent, "0 0.475000 0.475000 0.450000 0.450000");
}

#[test]
fn test_mask_pipeline_skips() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dataset = setup_mask_dataset(temp_dir.path());
    save_mask(&dataset, "orphan", &[(5, 5, 15, 15)]);
    fs::write(dataset.join("masks_human/corrupt.png"), b"definitely not a png").unwrap();
    fs::write(dataset.join("img/corrupt.jpg"), b"corrupt").unwrap();

    let output = temp_dir.path().join("out");
    let summary = process_mask_dataset(&ConversionConfig::new(&dataset, &output)).unwrap();

    assert_eq!(summary.stats.total_items, 2);
    assert_eq!(summary.stats.skipped_missing_image, 1);
    assert_eq!(summary.stats.skipped_unreadable_mask, 1);
    assert_eq!(summary.stats.written_images, 0);
    for split in ["train", "val"] {
        assert!(file_names(&output.join("labels").join(split)).is_empty());
        assert!(file_names(&output.join("images").join(split)).is_empty());
    }
    assert!(output.join("data.yaml").exists());
}
