use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use save_tiger::report::will_log;
use save_tiger::{
    check_braces, load_config, rewrite_key_blocks, splice_span, take_reports, BlockScanner,
    Confidence, Config, ErrorKey, LogReport, ParsedBlock, SaveFile, ScanError, ScanOptions,
    Severity,
};

static TEST_MUTEX: Mutex<()> = Mutex::new(());

fn take_report(vec: &mut Vec<LogReport>, pathname: &Path, msg: &str) -> Option<LogReport> {
    let i = vec
        .iter()
        .position(|r| r.msg == msg && r.pointers.first().is_some_and(|p| p.loc.pathname() == pathname))?;
    Some(vec.remove(i))
}

fn take_reports_for(pathname: &Path) -> Vec<LogReport> {
    take_reports()
        .into_iter()
        .filter(|r| r.pointers.first().is_some_and(|p| p.loc.pathname() == pathname))
        .collect()
}

fn sample() -> SaveFile {
    SaveFile::read(Path::new("tests/files/sample.v2")).unwrap()
}

#[test]
fn test_find_whole_tokens() {
    let file = sample();
    let buffer = file.contents();
    let scanner = BlockScanner::default();

    let span = scanner.find_key_block(buffer, "CHI", 0).unwrap().unwrap();
    let block = ParsedBlock::new(buffer, span, scanner.options()).unwrap();
    assert!(block.raw_text().starts_with("\n\tcivilized=yes\n\tprestige=120.500"));
    assert_eq!(block.get_field_bool("civilized"), Ok(Some(true)));
    assert_eq!(block.get_field_integer("capital"), Ok(Some(1)));
    assert_eq!(file.loc_at(span.start).line, 24);

    let chief = scanner.find_key_block(buffer, "CHIEF", 0).unwrap().unwrap();
    let chief = ParsedBlock::new(buffer, chief, scanner.options()).unwrap();
    assert_eq!(chief.get_field_bool("civilized"), Ok(Some(false)));

    assert_eq!(scanner.find_key_block(buffer, "JAP", 0), Ok(None));
}

#[test]
fn test_raw_scan_sees_comments() {
    let file = sample();
    let buffer = file.contents();
    let span = BlockScanner::raw().find_key_block(buffer, "CHI", 0).unwrap().unwrap();
    assert_eq!(span.text(buffer), Ok("{ this comment must not be found }"));
}

#[test]
fn test_key_path() {
    let file = sample();
    let buffer = file.contents();
    let scanner = BlockScanner::default();

    let span = scanner.find_key_path(buffer, &["CHI", "INNER"]).unwrap().unwrap();
    assert_eq!(span.text(buffer), Ok("{\n\t\ta=1\n\t\tb={ 1 2 3 }\n\t}"));

    let span = scanner.find_key_path(buffer, &["1", "farmers", "ideology"]).unwrap().unwrap();
    let ideology = ParsedBlock::new(buffer, span, scanner.options()).unwrap();
    assert_eq!(ideology.get_field_number("3"), Ok(Some(45.5)));

    assert_eq!(scanner.find_key_path(buffer, &["CHI", "farmers"]), Ok(None));
}

#[test]
fn test_all_blocks() {
    let file = sample();
    let buffer = file.contents();
    let scanner = BlockScanner::default();

    let flags: Vec<_> = scanner.find_key_blocks(buffer, "flags").collect::<Result<_, _>>().unwrap();
    assert_eq!(flags.len(), 2);
    let last = ParsedBlock::new(buffer, flags[1], scanner.options()).unwrap();
    assert_eq!(last.get_field_bool("opium_war_won"), Ok(Some(true)));

    let results = scanner.find_key_blocks_par(buffer, &["CHI", "ENG", "flags", "JAP"]);
    let counts: Vec<_> = results.iter().map(|(key, r)| (*key, r.as_ref().unwrap().len())).collect();
    assert_eq!(counts, vec![("CHI", 1), ("ENG", 1), ("flags", 2), ("JAP", 0)]);
}

#[test]
fn test_splice_leaves_rest_alone() {
    let file = sample();
    let buffer = file.contents();
    let scanner = BlockScanner::default();

    let eng = scanner.find_key_block(buffer, "ENG", 0).unwrap().unwrap();
    let eng_text = eng.text(buffer).unwrap().to_owned();

    let inner = scanner.find_key_path(buffer, &["CHI", "INNER"]).unwrap().unwrap();
    let edited = splice_span(buffer, inner, "{ a=2 }").unwrap();
    assert_eq!(edited.len(), buffer.len() - inner.len() + 7);

    let new_eng = scanner.find_key_block(&edited, "ENG", 0).unwrap().unwrap();
    assert_eq!(new_eng.text(&edited), Ok(eng_text.as_str()));
    let new_inner = scanner.find_key_path(&edited, &["CHI", "INNER"]).unwrap().unwrap();
    assert_eq!(new_inner.text(&edited), Ok("{ a=2 }"));

    let chi = scanner.find_key_block(buffer, "CHI", 0).unwrap().unwrap();
    let same = splice_span(buffer, chi, chi.text(buffer).unwrap()).unwrap();
    assert_eq!(same, buffer);
}

#[test]
fn test_rewrite_and_write_back() {
    let _guard = TEST_MUTEX.lock().unwrap();
    let pathname = Path::new("tests/files/latin1.v2");
    let mut file = SaveFile::read(pathname).unwrap();
    assert_eq!(file.encoding().name(), "windows-1252");
    assert!(file.contents().contains("\"Zürich\""));
    let mut reports = take_reports_for(pathname);
    assert!(take_report(&mut reports, pathname, "file is not valid UTF-8, reading it as Windows-1252").is_some());

    let scanner = BlockScanner::default();
    let rewrite = rewrite_key_blocks(&scanner, file.contents(), "SWI", |block| {
        let capital = block.get_field_value("capital_name").ok()??;
        Some(format!("{{\n\tcivilized=no\n\tcapital_name=\"{}\"\n}}", capital.as_str().replace('ü', "ue")))
    })
    .unwrap();
    assert_eq!(rewrite.replaced, 1);
    let genf = rewrite.buffer.replace("Zueri", "Genè");
    file.replace_contents(genf);

    let out: PathBuf = std::env::temp_dir().join(format!("save-tiger-{}.v2", std::process::id()));
    file.write(&out).unwrap();
    let bytes = fs::read(&out).unwrap();
    assert!(bytes.windows(6).any(|w| w == b"Gen\xe8ch"));
    assert!(bytes.starts_with(b"name=\"Z\xfcrich\"\n"));

    let reread = SaveFile::read(&out).unwrap();
    assert_eq!(reread.encoding().name(), "windows-1252");
    assert_eq!(reread.contents(), file.contents());
    let _ = take_reports_for(&out);
    fs::remove_file(&out).unwrap();
}

#[test]
fn test_corrupt_file() {
    let _guard = TEST_MUTEX.lock().unwrap();
    let pathname = Path::new("tests/files/corrupt.v2");
    let file = SaveFile::read(pathname).unwrap();

    let balance = check_braces(&file, ScanOptions::default());
    assert!(!balance.is_balanced());
    assert_eq!(balance.max_depth, 2);
    assert_eq!(balance.unopened.len(), 1);

    let mut reports = take_reports_for(pathname);
    let report = take_report(&mut reports, pathname, "unexpected `}`").unwrap();
    assert_eq!(report.key, ErrorKey::BraceError);
    assert_eq!(report.confidence, Confidence::Strong);
    assert_eq!(report.pointers[0].loc.line, 10);
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.key == ErrorKey::BracePlacement));

    let scanner = BlockScanner::default();
    let doc = ParsedBlock::document(file.contents(), scanner.options());
    let results: Vec<_> = doc.entries().collect();
    assert_eq!(results.len(), 2);
    assert!(matches!(results[1], Err(ScanError::UnmatchedClose { .. })));
}

#[test]
fn test_config() {
    let _guard = TEST_MUTEX.lock().unwrap();
    let pathname = Path::new("tests/files/save-tiger.conf");
    let config = load_config(pathname).unwrap();
    assert_eq!(config.scan, ScanOptions { quotes: true, comments: false });
    assert!(!config.output.color);
    assert_eq!(config.output.min_severity, Severity::Untidy);

    let mut reports = take_reports_for(pathname);
    assert!(take_report(&mut reports, pathname, "unknown config key `colour`").is_some());
    assert!(reports.is_empty());

    config.apply();
    assert!(!will_log(Severity::Tips, Confidence::Strong));
    assert!(will_log(Severity::Untidy, Confidence::Weak));
    Config::default().apply();
    assert!(will_log(Severity::Tips, Confidence::Weak));

    assert!(load_config(Path::new("tests/files/missing.conf")).is_err());
}
