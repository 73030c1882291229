//! Rendering laws checked against real files on disk.

use flake_context::{
    FailureContextRenderer, FrameChain, FrameRole, FsSourceReader, SourceReader,
    SourceUnavailable, StackFrame,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

fn write_numbered(root: &Path, relative: &str, prefix: &str, count: usize) -> PathBuf {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body = (1..=count)
        .map(|n| format!("{prefix} {n}"))
        .collect::<Vec<_>>()
        .join("\n");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn cascade_renders_outer_subject_inner() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let outer = write_numbered(root, "contexts/helper_file.py", "outer_file_line", 19);
    let subject = write_numbered(root, "scenarios/scenario_1.py", "scenario_file_line", 19);
    let inner = write_numbered(root, "helper/helper_file.py", "inner_file_line", 19);

    let chain = FrameChain::new(vec![
        StackFrame::new(&outer, 15, 18),
        StackFrame::new(&subject, 10, 13),
        StackFrame::new(&inner, 2, 6),
    ]);

    let renderer = FailureContextRenderer::new(FsSourceReader, root);
    let context = renderer
        .render(&chain, Path::new("scenarios/scenario_1.py"))
        .unwrap();

    let expected = [
        format!("# {}:", outer.display()),
        ">  18|outer_file_line 18".to_string(),
        String::new(),
        format!("# {}:", subject.display()),
        "    9|scenario_file_line 9".to_string(),
        "   10|scenario_file_line 10".to_string(),
        "   11|scenario_file_line 11".to_string(),
        "   12|scenario_file_line 12".to_string(),
        ">  13|scenario_file_line 13".to_string(),
        "   14|scenario_file_line 14".to_string(),
        "   15|scenario_file_line 15".to_string(),
        "   16|scenario_file_line 16".to_string(),
        String::new(),
        format!("# {}:", inner.display()),
        ">   6|inner_file_line 6".to_string(),
    ]
    .join("\n");

    assert_eq!(context.to_text(), expected);
    assert_eq!(context.subject_index(), 1);
    assert_eq!(
        context.blocks().iter().map(|b| b.role).collect::<Vec<_>>(),
        vec![FrameRole::Context, FrameRole::Subject, FrameRole::Context]
    );
}

#[test]
fn missing_file_does_not_abort_report() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let subject = write_numbered(root, "scenarios/a.py", "line", 10);

    let chain = FrameChain::new(vec![
        StackFrame::new(root.join("helpers/deleted.py"), 1, 2),
        StackFrame::new(&subject, 3, 4),
    ]);

    let renderer = FailureContextRenderer::new(FsSourceReader, root);
    let context = renderer.render(&chain, Path::new("scenarios/a.py")).unwrap();

    assert_eq!(context.blocks().len(), 2);
    assert_eq!(context.blocks()[0].role, FrameRole::Unavailable);
    assert!(context.to_text().contains(">   4|line 4"));
}

/// In-memory sources for property tests.
struct MapReader(HashMap<PathBuf, Vec<String>>);

impl SourceReader for MapReader {
    fn read_lines(&self, path: &Path) -> Result<Vec<String>, SourceUnavailable> {
        self.0.get(path).cloned().ok_or_else(|| {
            SourceUnavailable::new(path, io::Error::new(io::ErrorKind::NotFound, "absent"))
        })
    }
}

fn frame_strategy() -> impl Strategy<Value = (usize, usize, usize)> {
    // (file length, anchor, error) with anchor <= error
    (0usize..60).prop_flat_map(|len| {
        (Just(len), 0usize..70).prop_flat_map(|(len, anchor)| (Just(len), Just(anchor), anchor..80))
    })
}

proptest! {
    #[test]
    fn rendering_is_deterministic(frames in proptest::collection::vec(frame_strategy(), 1..6)) {
        let mut files: HashMap<PathBuf, Vec<String>> = HashMap::new();
        let mut chain = Vec::new();
        for (i, (len, anchor, error)) in frames.iter().enumerate() {
            let path = PathBuf::from(format!("/proj/f{i}.py"));
            files.insert(path.clone(), (1..=*len).map(|n| format!("src {n}")).collect());
            chain.push(StackFrame::new(path, *anchor, *error));
        }
        let chain = FrameChain::new(chain);
        let renderer = FailureContextRenderer::new(MapReader(files), "/proj");

        let first = renderer.render(&chain, Path::new("f0.py")).unwrap();
        let second = renderer.render(&chain, Path::new("f0.py")).unwrap();
        prop_assert_eq!(first.to_text(), second.to_text());
    }

    #[test]
    fn subject_rows_stay_inside_file((len, anchor, error) in frame_strategy()) {
        let path = PathBuf::from("/proj/s.py");
        let files: HashMap<PathBuf, Vec<String>> = HashMap::from([(path.clone(), (1..=len).map(|n| format!("s {n}")).collect())]);
        let renderer = FailureContextRenderer::new(MapReader(files), "/proj");
        let chain = FrameChain::new(vec![StackFrame::new(&path, anchor, error)]);

        let context = renderer.render(&chain, Path::new("s.py")).unwrap();
        for row in context.to_text().lines().skip(1) {
            let number: usize = row[2..row.find('|').unwrap()].trim().parse().unwrap();
            prop_assert!(number >= 1 && number <= len);
            prop_assert_eq!(row.starts_with('>'), number == error);
        }
    }

    #[test]
    fn subject_marks_error_row_inside_file(len in 1usize..60, anchor in 0usize..80, pick in 0usize..60) {
        let error = pick % len + 1;
        let path = PathBuf::from("/proj/s.py");
        let files: HashMap<PathBuf, Vec<String>> = HashMap::from([(path.clone(), (1..=len).map(|n| format!("s {n}")).collect())]);
        let renderer = FailureContextRenderer::new(MapReader(files), "/proj");
        let chain = FrameChain::new(vec![StackFrame::new(&path, anchor, error)]);

        let context = renderer.render(&chain, Path::new("s.py")).unwrap();
        let marked: Vec<String> = context.to_text().lines().filter(|r| r.starts_with('>')).map(str::to_string).collect();
        prop_assert_eq!(marked, vec![format!(">{:>4}|s {}", error, error)]);
    }

    #[test]
    fn context_frame_renders_exactly_one_row(len in 1usize..60, pick in 0usize..60) {
        let error = pick % len + 1;
        let subject = PathBuf::from("/proj/s.py");
        let helper = PathBuf::from("/proj/h.py");
        let files: HashMap<PathBuf, Vec<String>> = HashMap::from([
            (subject.clone(), vec!["s".to_string(); 5]),
            (helper.clone(), (1..=len).map(|n| format!("h {n}")).collect()),
        ]);
        let renderer = FailureContextRenderer::new(MapReader(files), "/proj");
        let chain = FrameChain::new(vec![
            StackFrame::new(&helper, 1, error),
            StackFrame::new(&subject, 1, 2),
        ]);

        let context = renderer.render(&chain, Path::new("s.py")).unwrap();
        let block = &context.blocks()[0].text;
        let rows: Vec<&str> = block.lines().skip(1).collect();
        prop_assert_eq!(rows.len(), 1);
        prop_assert_eq!(rows[0].to_string(), format!(">{:>4}|h {}", error, error));
    }
}
