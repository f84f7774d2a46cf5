use lyric_recommender::{
    engine::matrix::SimilarityMatrix, ingest, ArtifactId, ArtifactStore, CorpusTable, FeatureBuilder, FeatureMatrix,
    RecommendError, SimilarityEngine, SimilarityStrategy,
};

const DATASET: &str = "\
artist,song,link,text
ABBA,Dancing Queen,/a/dancing,\"Friday night and the lights are low, dancing queen\"
ABBA,Mamma Mia,/a/mamma,\"Mamma mia, here I go again, my my how can I resist you\"
Adele,Hello,/b/hello,\"Hello from the other side, I must have called a thousand times\"
Adele,Skyfall,/b/skyfall,\"This is the end, hold your breath and count to ten\"
Beatles,Let It Be,/c/letitbe,\"When I find myself in times of trouble, let it be, whisper words of wisdom\"
Beatles,Hey Jude,/c/heyjude,\"Hey Jude, don't make it bad, take a sad song and make it better\"
Queen,Bohemian Rhapsody,/d/bohemian,\"Is this the real life, is this just fantasy, caught in a landslide\"
Queen,Night Dance,/d/night,\"Friday night dancing, the lights are low and the night is young\"
";

fn build(dir: &std::path::Path, precompute: bool) -> CorpusTable {
    let raw = ingest::read_csv_from(DATASET.as_bytes()).unwrap();
    let corpus = CorpusTable::from_raw(&raw);
    let features: FeatureMatrix = FeatureBuilder::default().fit_transform(&corpus.cleaned_texts()).unwrap();
    let similarity = precompute.then(|| SimilarityMatrix::compute(&features));
    ArtifactStore::new(dir).save(&corpus, &features, similarity.as_ref()).unwrap();
    corpus
}

#[test]
fn build_save_load_recommend() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = build(dir.path(), false);
    assert_eq!(corpus.len(), 8);

    let engine = SimilarityEngine::load(dir.path(), SimilarityStrategy::Lazy).unwrap();
    assert_eq!(engine.list_titles().len(), 8);
    assert_eq!(engine.list_titles()[0], "Dancing Queen");

    let recs = engine.recommend("dancing queen", 3).unwrap();
    assert_eq!(recs.resolved_title, "Dancing Queen");
    assert_eq!(recs.songs.len(), 3);
    assert_eq!(recs.songs[0].song, "Night Dance");
    assert!(recs.songs.iter().all(|s| s.song != "Dancing Queen"));
    assert_eq!(recs.songs.iter().map(|s| s.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn unknown_title_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    build(dir.path(), false);
    let engine = SimilarityEngine::load(dir.path(), SimilarityStrategy::Lazy).unwrap();
    assert!(engine.recommend("Nonexistent Song", 5).is_none());
}

#[test]
fn persisted_matrix_matches_lazy_ranking() {
    let lazy_dir = tempfile::tempdir().unwrap();
    let pre_dir = tempfile::tempdir().unwrap();
    build(lazy_dir.path(), false);
    build(pre_dir.path(), true);

    let lazy = SimilarityEngine::load(lazy_dir.path(), SimilarityStrategy::Lazy).unwrap();
    let pre = SimilarityEngine::load(pre_dir.path(), SimilarityStrategy::Precomputed).unwrap();
    assert!(pre.similarity_matrix().is_some());
    for title in lazy.list_titles() {
        assert_eq!(lazy.recommend(title, 7), pre.recommend(title, 7));
    }
}

#[test]
fn rebuilt_corpus_invalidates_old_features() {
    let dir = tempfile::tempdir().unwrap();
    build(dir.path(), false);
    let store = ArtifactStore::new(dir.path());

    // replace the corpus with a different one, leave the old features behind
    let other = CorpusTable::from_raw(&ingest::read_csv_from(
        "artist,song,text\nX,Only,\"something else entirely\"\n".as_bytes(),
    )
    .unwrap());
    let other_features: FeatureMatrix = FeatureBuilder::default().fit_transform(&other.cleaned_texts()).unwrap();
    let tmp = tempfile::tempdir().unwrap();
    ArtifactStore::new(tmp.path()).save(&other, &other_features, None).unwrap();
    std::fs::copy(tmp.path().join("corpus.cbor"), store.path(ArtifactId::Corpus)).unwrap();

    let err = SimilarityEngine::load(dir.path(), SimilarityStrategy::Lazy).unwrap_err();
    assert!(matches!(err, RecommendError::SnapshotMismatch { .. }));
}
