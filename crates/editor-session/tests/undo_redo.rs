use editor_session::{Delta, Document, EditSession, Position, Range};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

const SNIPPETS: &[&str] = &["x", "yz", "\n", "a\nb", "\t", "中", "line\r\nnext", "()"];

fn random_position(rng: &mut StdRng, lines: &[String]) -> Position {
    let row = rng.gen_range(0..lines.len());
    let column = rng.gen_range(0..=lines[row].chars().count());
    Position::new(row, column)
}

fn random_range(rng: &mut StdRng, lines: &[String]) -> Range {
    let a = random_position(rng, lines);
    let b = random_position(rng, lines);
    Range::from_points(a.min(b), a.max(b))
}

fn random_edit(rng: &mut StdRng, session: &mut EditSession) {
    let lines = session.document().all_lines().to_vec();
    let text = SNIPPETS[rng.gen_range(0..SNIPPETS.len())];
    match rng.gen_range(0..3) {
        0 => {
            let pos = random_position(rng, &lines);
            session.insert(pos, text);
        }
        1 => {
            let range = random_range(rng, &lines);
            session.remove(range);
        }
        _ => {
            let range = random_range(rng, &lines);
            session.replace(range, text);
        }
    }
}

#[test]
fn test_reverting_recorded_deltas_restores_document() {
    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let original = "first line\n\tsecond\n\nfourth 中文";
        let mut doc = Document::new(original);
        let recorded = Arc::new(Mutex::new(Vec::<Delta>::new()));
        let sink = Arc::clone(&recorded);
        doc.subscribe(move |delta| sink.lock().unwrap().push(delta.clone()));
        let before = doc.all_lines().to_vec();

        for _ in 0..40 {
            let lines = doc.all_lines().to_vec();
            let text = SNIPPETS[rng.gen_range(0..SNIPPETS.len())];
            if rng.gen_bool(0.5) {
                doc.insert(random_position(&mut rng, &lines), text);
            } else {
                doc.replace(random_range(&mut rng, &lines), text);
            }
        }

        let deltas = recorded.lock().unwrap().clone();
        doc.revert_deltas(&deltas);
        assert_eq!(doc.all_lines(), before.as_slice(), "seed {seed}");
    }
}

#[test]
fn test_undo_all_then_redo_all() {
    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut session = EditSession::new("alpha\nbeta {\n  gamma\n}\ndelta");
        let original = session.document().all_lines().to_vec();

        for _ in 0..25 {
            random_edit(&mut rng, &mut session);
            session.mark_undo_group();
        }
        let edited = session.document().all_lines().to_vec();

        while session.has_undo() {
            session.undo();
        }
        assert_eq!(session.document().all_lines(), original.as_slice(), "seed {seed}");

        while session.has_redo() {
            session.redo();
        }
        assert_eq!(session.document().all_lines(), edited.as_slice(), "seed {seed}");
    }
}

#[test]
fn test_undo_restores_folds_destroyed_by_edit() {
    let mut session = EditSession::new("a {\n  b\n}\nc");
    session.add_fold("...", Range::new(0, 3, 2, 0)).unwrap();

    session.remove(Range::new(0, 2, 2, 1));
    assert_eq!(session.value(), "a \nc");
    assert_eq!(session.all_folds().count(), 0);

    let selection = session.undo();
    assert_eq!(session.value(), "a {\n  b\n}\nc");
    assert_eq!(selection, Some(Range::new(0, 2, 2, 1)));
    let folds: Vec<Range> = session.all_folds().map(|fold| fold.range).collect();
    assert_eq!(folds, vec![Range::new(0, 3, 2, 0)]);
    assert_eq!(session.screen_length(), 2);
}

#[test]
fn test_removing_every_row_undoes_exactly() {
    let mut session = EditSession::new("a\nb");
    assert_eq!(session.remove_lines(0, 1).unwrap(), vec!["a", "b"]);
    assert_eq!(session.value(), "");
    assert_eq!(session.len(), 1);

    session.undo();
    assert_eq!(session.value(), "a\nb");
    session.redo();
    assert_eq!(session.value(), "");

    let mut session = EditSession::new("f {\n x\n}");
    session.add_fold("...", Range::new(0, 3, 2, 0)).unwrap();
    session.remove_lines(0, 2).unwrap();
    assert_eq!(session.all_folds().count(), 0);

    session.undo();
    assert_eq!(session.value(), "f {\n x\n}");
    let folds: Vec<Range> = session.all_folds().map(|fold| fold.range).collect();
    assert_eq!(folds, vec![Range::new(0, 3, 2, 0)]);
    assert_eq!(session.screen_length(), 1);
}

#[test]
fn test_typing_inside_fold_unfolds_and_undo_refolds() {
    let mut session = EditSession::new("fn f() {\n    body\n}");
    session.add_fold("...", Range::new(0, 8, 2, 0)).unwrap();

    session.insert(Position::new(1, 4), "new_");
    assert_eq!(session.all_folds().count(), 0);
    assert_eq!(session.line(1), "    new_body");

    session.undo();
    assert_eq!(session.line(1), "    body");
    assert_eq!(session.all_folds().count(), 1);
}

#[test]
fn test_merged_steps_undo_together() {
    let mut session = EditSession::new("");
    session.insert(Position::new(0, 0), "a");
    session.mark_undo_group();
    session.set_merge_undo_deltas(true);
    session.insert(Position::new(0, 1), "b");
    session.mark_undo_group();
    session.insert(Position::new(0, 2), "c");
    session.mark_undo_group();

    assert_eq!(session.undo_manager().undo_depth(), 2);
    session.undo();
    assert_eq!(session.value(), "ab");
    session.undo();
    assert_eq!(session.value(), "");
    assert!(!session.has_undo());
}

#[test]
fn test_redo_is_dropped_by_new_edit() {
    let mut session = EditSession::new("abc");
    session.insert(Position::new(0, 3), "d");
    session.undo();
    assert!(session.has_redo());

    session.insert(Position::new(0, 0), "z");
    assert!(!session.has_redo());
    session.mark_undo_group();
    assert!(!session.has_redo());
    assert_eq!(session.undo_manager().undo_depth(), 1);
}

#[test]
fn test_clean_state_tracking() {
    let mut session = EditSession::new("saved");
    assert!(session.undo_manager().is_clean());

    session.insert(Position::new(0, 5), "!");
    session.mark_undo_group();
    assert!(!session.undo_manager().is_clean());

    session.undo();
    assert!(session.undo_manager().is_clean());
    session.redo();
    session.undo_manager_mut().mark_clean();
    assert!(session.undo_manager().is_clean());
}

#[test]
fn test_set_value_resets_history_and_folds() {
    let mut session = EditSession::new("x {\n}\n");
    session.add_fold("...", Range::new(0, 3, 1, 0)).unwrap();
    session.insert(Position::new(2, 0), "tail");

    session.set_value("fresh\ntext");
    assert_eq!(session.len(), 2);
    assert_eq!(session.all_folds().count(), 0);
    assert!(!session.has_undo());
    assert_eq!(session.undo(), None);
}
