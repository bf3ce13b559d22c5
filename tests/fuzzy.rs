use anyhow::Result;

use slobdict::fuzzy::{BestMatches, CancelToken, LongestCommonSubstring, SuggestionWorker};

#[test]
fn lcs_counts_longest_shared_run() {
    let mut lcs = LongestCommonSubstring::new();
    assert_eq!(lcs.evaluate("kitten", "sitting"), 3); // "itt"
    assert_eq!(lcs.evaluate("", "anything"), 0);
    assert_eq!(lcs.evaluate("abc", "xyz"), 0);
    // сравнение по символам, не байтам
    assert_eq!(lcs.evaluate("жёлтый", "тёмно-жёлтый"), 6);
    // буфер растёт под длинные строки
    let long = "a".repeat(600);
    assert_eq!(lcs.evaluate(&long, &long), 600);
}

#[test]
fn best_matches_rank_by_common_chars() {
    let candidates = ["banana", "bandana", "cabana", "apple", "ban"];
    let mut bm = BestMatches::new();
    assert!(bm.evaluate("bandanas", &candidates, &CancelToken::new()));
    assert_eq!(bm.len(), candidates.len());

    let ranked: Vec<(&str, usize)> = bm.best_matches().collect();
    assert_eq!(ranked[0], ("bandana", 7));
    assert_eq!(ranked.last().map(|(_, s)| *s), Some(1));
    assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));

    let top = bm.top(2);
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].phrase, "bandana");
}

#[test]
fn cancelled_evaluation_keeps_previous_result() {
    let mut bm = BestMatches::new();
    assert!(bm.evaluate("cat", &["cat", "dog"], &CancelToken::new()));

    let token = CancelToken::new();
    token.cancel();
    assert!(!bm.evaluate("dog", &["cat", "dog", "bird"], &token));
    assert_eq!(bm.len(), 2);
    assert_eq!(bm.top(1)[0].phrase, "cat");
}

#[test]
fn worker_publishes_only_newest_query() -> Result<()> {
    let candidates: Vec<String> = (0..50_000).map(|i| format!("word{:05}", i)).collect();
    let worker = SuggestionWorker::new(candidates, 5);
    assert_eq!(worker.candidate_count(), 50_000);

    let g1 = worker.submit("word1")?;
    let g2 = worker.submit("word2")?;
    let g3 = worker.submit("word49999")?;
    assert!(g1 < g2 && g2 < g3);
    worker.wait_idle()?;

    let latest = worker.latest().expect("newest query must publish");
    assert_eq!(latest.generation, g3);
    assert_eq!(latest.query, "word49999");
    assert_eq!(latest.matches.len(), 5);
    assert_eq!(latest.matches[0].phrase, "word49999");
    assert_eq!(latest.matches[0].common_chars, 9);
    Ok(())
}

#[test]
fn worker_cancel_leaves_nothing_published() -> Result<()> {
    let candidates: Vec<String> = (0..200_000).map(|i| format!("entry-{}", i)).collect();
    let worker = SuggestionWorker::new(candidates, 3);
    worker.submit("entry-1")?;
    worker.cancel();
    worker.wait_idle()?;
    // либо отменено, либо успело закончиться до cancel()
    if let Some(s) = worker.latest() {
        assert_eq!(s.query, "entry-1");
    }

    worker.submit("entry-199999")?;
    worker.wait_idle()?;
    assert_eq!(worker.latest().map(|s| s.query), Some("entry-199999".to_string()));
    Ok(())
}
