//! CSV export through cleaning, normalization and the NDJSON sink

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::Value;

use foodfacts::{
    load, normalize, FieldNormalizer, FlatTable, NdjsonSink, PipelineConfig, RunManifest, TableName,
};

const EXPORT: &str = "\
code,product_name,quantity,brands,categories_en,countries_en,labels_en,allergens_en,nutriscore_score,nutriscore_grade,nova_group,energy-kcal_100g,fat_100g,saturated-fat_100g
001,Cola,330 ml,\"Acme, Acme\",Beverages,France,,caffeine,18,E,4,42,0,0
002,Crisps,150g,\" Acme,Bolt \",\"Snacks,Salty snacks\",\"France,Spain\",Organic,,11,d,3,536,34.5,-1
nan,Mystery,unknown,X,,,,,,,,,,
003,unknown,,,,,,,,z,9,N/A,,
";

fn read_ndjson(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_csv_export_writes_every_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::default();

    let cleaner = FieldNormalizer::new(&config.cleaning).unwrap();
    let (flat, cleaning) = cleaner.clean_csv(EXPORT.as_bytes()).unwrap();
    assert_eq!(cleaning.rows, 4);
    assert_eq!(cleaning.negative_values, 1);
    assert_eq!(cleaning.unparseable_numbers, 1);
    assert_eq!(cleaning.out_of_domain_values, 2);

    let tables = normalize(&flat, &config.normalize);
    let report = load(&tables, NdjsonSink::create(dir.path()).unwrap()).unwrap();
    assert_eq!(report.rows(TableName::Products), Some(3));

    let mut manifest = RunManifest::start("products.csv");
    manifest.cleaning = Some(cleaning);
    manifest.normalize = Some(tables.stats.clone());
    manifest.load = Some(report);
    manifest.finish();
    let written: Value =
        serde_json::from_str(&fs::read_to_string(manifest.write_to(dir.path()).unwrap()).unwrap())
            .unwrap();
    assert_eq!(written["normalize"]["dropped_rows"], 1);
    assert_eq!(written["load"]["tables"]["product_brands"], 3);

    let products = read_ndjson(&dir.path().join("products.ndjson"));
    let codes: Vec<&str> = products.iter().map(|p| p["code"].as_str().unwrap()).collect();
    assert_eq!(codes, vec!["001", "002", "003"]);
    assert_eq!(products[0]["quantity_numeric"], 330.0);
    assert_eq!(products[0]["quantity_unit"], "ml");
    assert_eq!(products[0]["nutriscore_grade"], "e");
    assert_eq!(products[0]["nova_group"], 4);
    assert_eq!(products[2]["product_name"], Value::Null);
    assert_eq!(products[2]["nutriscore_grade"], Value::Null);
    assert_eq!(products[2]["nova_group"], Value::Null);
    assert!(products[0].get("allergens_en").is_none());

    let brands = read_ndjson(&dir.path().join("brands.ndjson"));
    let names: Vec<&str> = brands.iter().map(|b| b["brand_name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Acme", "Bolt", "X"]);
    assert_eq!(brands[0]["brand_id"], 1);

    let edges = read_ndjson(&dir.path().join("product_brands.ndjson"));
    assert_eq!(edges.len(), 3);
    assert!(edges.iter().all(|e| e["product_code"] != "nan"));

    let nutrition = read_ndjson(&dir.path().join("nutrition_facts.ndjson"));
    assert_eq!(nutrition.len(), 3);
    assert_eq!(nutrition[1]["fat_100g"], 34.5);
    assert_eq!(nutrition[1]["saturated_fat_100g"], Value::Null);
    assert_eq!(nutrition[2]["energy_kcal_100g"], Value::Null);
}

#[test]
fn test_cleaned_ndjson_input() {
    let input = "\
{\"code\": \"001\", \"brands\": [\"Acme\"], \"fat_100g\": 1.25}
{\"code\": 2.0, \"brands\": [\"Bolt\", \"Acme\"]}

{\"code\": null, \"brands\": [\"Zest\"]}
";
    let flat = FlatTable::from_ndjson(input.as_bytes()).unwrap();
    assert_eq!(flat.len(), 3);

    let tables = normalize(&flat, &PipelineConfig::default().normalize);
    let codes: Vec<&str> = tables.products.iter().map(|p| p.code.as_str()).collect();
    assert_eq!(codes, vec!["001", "2"]);
    assert_eq!(tables.stats.dropped_rows, 1);
}

#[test]
fn test_malformed_ndjson_reports_line() {
    let err = FlatTable::from_ndjson("{\"code\": \"001\"}\n{not json}\n".as_bytes()).unwrap_err();
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn test_config_file_with_env_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foodfacts.yaml");
    let mut file = fs::File::create(&path).unwrap();
    writeln!(file, "database:\n  batch_size: 50\nnormalize:\n  missing_key_sentinels: [\"n/a\"]").unwrap();

    let mut config = PipelineConfig::load_from_file(&path).unwrap();
    assert_eq!(config.database.batch_size, 50);
    assert_eq!(config.normalize.missing_key_sentinels, vec!["n/a".to_string()]);

    config
        .apply_env_with(|key| match key {
            "FOODFACTS_BATCH_SIZE" => Some("25".to_string()),
            "DATABASE_URL" => Some("loaded.db".to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(config.database.batch_size, 25);
    assert_eq!(config.database_url(None), "loaded.db");
    assert_eq!(config.database_url(Some("cli.db")), "cli.db");
}
