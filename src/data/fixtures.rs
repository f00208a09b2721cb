//! Inline datasets shared by the data-layer tests.

use std::sync::Arc;

use super::loader::{load_reader, LoadOptions};
use super::model::TrackTable;

/// Source-style header (un-normalized names, as in the public dataset).
pub const HEADER: &str = "track_name,artist(s)_name,released_year,released_month,released_day,streams,bpm,key,mode,danceability_%,valence_%,energy_%,acousticness_%,instrumentalness_%,liveness_%,speechiness_%";

/// Eight source rows: one `N/A` stream count, one exact duplicate (LALA),
/// one impossible date with an empty key (Leap Ghost), two multi-artist rows.
pub const SMALL_CSV: &str = "\
track_name,artist(s)_name,artist_count,released_year,released_month,released_day,in_spotify_playlists,streams,bpm,key,mode,danceability_%,valence_%,energy_%,acousticness_%,instrumentalness_%,liveness_%,speechiness_%
Seven,\"Latto, Jung Kook\",2,2023,7,14,553,141381703,125,B,Major,80,89,74,31,0,8,4
LALA,Myke Towers,1,2023,3,23,1474,133716286,92,C#,Major,71,61,74,7,0,10,4
vampire,Olivia Rodrigo,1,2023,6,30,1397,140003974,138,A,Minor,51,32,53,17,0,31,6
Cruel Summer,Taylor Swift,1,2019,8,23,7858,800840817,170,A,Major,55,58,72,11,0,11,15
Bad Streams,Latto,1,2021,5,1,10,N/A,100,B,Minor,10,10,10,10,0,10,5
Leap Ghost,Myke Towers,1,2022,2,30,12,5000,150,,Minor,60,40,65,20,1,12,7
Old One,\"Taylor Swift, Latto\",2,1999,12,1,99,2500,100,C#,Minor,45,20,35,60,2,9,3
LALA,Myke Towers,1,2023,3,23,1474,133716286,92,C#,Major,71,61,74,7,0,10,4
";

/// One CSV line matching [`HEADER`]; the remaining features are fixed.
#[allow(clippy::too_many_arguments)]
pub fn row(
    name: &str,
    artist: &str,
    year: i32,
    bpm: u32,
    key: &str,
    mode: &str,
    danceability: u8,
    energy: u8,
    valence: u8,
    streams: &str,
) -> String {
    format!(
        "{name},\"{artist}\",{year},1,1,{streams},{bpm},{key},{mode},{danceability},{valence},{energy},20,0,10,5"
    )
}

pub fn table(csv: &str) -> TrackTable {
    load_reader(csv.as_bytes(), &LoadOptions::default()).expect("fixture CSV must load")
}

pub fn shared(csv: &str) -> Arc<TrackTable> {
    Arc::new(table(csv))
}
