//! Raw lyric dataset reading (batch side only).

use std::{io::Read, path::Path};

use rand::{rngs::StdRng, seq::index, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RecommendError, Result};

/// One song as found in the raw dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSong {
    pub artist: String,
    pub song: String,
    pub text: String,
}

/// Read a lyrics CSV with at least `artist`, `song` and `text` columns.
/// Other columns (e.g. `link`) are ignored. Rows with a blank title are skipped.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawSong>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| RecommendError::io(path, e))?;
    let songs = read_csv_from(file)?;
    info!(path = %path.display(), rows = songs.len(), "dataset loaded");
    Ok(songs)
}

pub fn read_csv_from<R: Read>(reader: R) -> Result<Vec<RawSong>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(RecommendError::MissingColumn(name))
    };
    let artist_col = column("artist")?;
    let song_col = column("song")?;
    let text_col = column("text")?;

    let mut songs = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        let song = field(song_col);
        if song.trim().is_empty() {
            skipped += 1;
            continue;
        }
        songs.push(RawSong {
            artist: field(artist_col),
            song,
            text: field(text_col),
        });
    }
    if skipped > 0 {
        warn!(skipped, "rows without a song title were dropped");
    }
    Ok(songs)
}

/// Reproducible random sample of `n` rows, in draw order.
/// Returns the input unchanged when it has no more than `n` rows.
pub fn sample(rows: Vec<RawSong>, n: usize, seed: u64) -> Vec<RawSong> {
    if rows.len() <= n {
        return rows;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let picked = index::sample(&mut rng, rows.len(), n);
    let mut slots: Vec<Option<RawSong>> = rows.into_iter().map(Some).collect();
    let sampled: Vec<RawSong> = picked.iter().filter_map(|i| slots[i].take()).collect();
    info!(rows = sampled.len(), seed, "dataset sampled");
    sampled
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "artist,song,link,text\n\
ABBA,Ahe's My Kind Of Girl,/a/abba/ahes+my+kind+of+girl_20598417.html,\"Look at her face, it's a wonderful face\nAnd it means something special to me\"\n\
ABBA,\"Andante, Andante\",/a/abba/andante+andante_20002708.html,\"Take it easy with me, please\"\n\
Nobody,,/x,\"orphan lyrics\"\n";

    #[test]
    fn reads_quoted_multiline_fields_and_skips_untitled_rows() {
        let songs = read_csv_from(CSV.as_bytes()).unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].artist, "ABBA");
        assert_eq!(songs[1].song, "Andante, Andante");
        assert!(songs[0].text.contains('\n'));
    }

    #[test]
    fn missing_column_is_named() {
        let err = read_csv_from("artist,title,text\nA,B,C\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RecommendError::MissingColumn("song")));
    }

    fn rows(n: usize) -> Vec<RawSong> {
        (0..n)
            .map(|i| RawSong {
                artist: format!("artist {i}"),
                song: format!("song {i}"),
                text: String::new(),
            })
            .collect()
    }

    #[test]
    fn sample_is_seeded_and_without_replacement() {
        let a = sample(rows(100), 10, 7);
        let b = sample(rows(100), 10, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        let mut titles: Vec<&str> = a.iter().map(|s| s.song.as_str()).collect();
        titles.sort_unstable();
        titles.dedup();
        assert_eq!(titles.len(), 10);
    }

    #[test]
    fn sample_larger_than_input_is_identity() {
        assert_eq!(sample(rows(3), 10, 1), rows(3));
    }
}
