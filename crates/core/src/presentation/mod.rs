//! Derived, stateless view of a mounted release.
//!
//! [`present`] is recomputed from scratch on every player state change and
//! never feeds back into the player.

use std::fmt;

use crate::{Credits, Labels, PlayerState, Release};

/// Download affordance for one file of a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub url: String,
    /// Final path segment of the URL, used as the suggested file name.
    pub filename: String,
    /// Upper-cased final dot-delimited segment of the URL.
    pub label: String,
}

impl DownloadLink {
    pub fn from_url(url: &str) -> Self {
        let filename = url.rsplit('/').next().unwrap_or(url).to_string();
        let label = url.rsplit('.').next().unwrap_or(url).to_uppercase();
        Self {
            url: url.to_string(),
            filename,
            label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRow {
    pub index: usize,
    pub title: String,
    /// Set on the row of the loaded track; rendered emphasized.
    pub active: bool,
    pub info: Option<String>,
    pub downloads: Vec<DownloadLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<T> {
    pub heading: String,
    pub body: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditGroup {
    pub label: String,
    /// Contributor names joined with `", "`.
    pub names: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseView {
    pub title: String,
    pub cover: String,
    pub is_playing: bool,
    pub is_loading: bool,
    pub tracks: Vec<TrackRow>,
    pub info: Option<Section<String>>,
    pub links: Option<Section<Vec<(String, String)>>>,
    pub credits: Option<Section<Vec<CreditGroup>>>,
}

pub fn present(state: &PlayerState, release: &Release, labels: &Labels) -> ReleaseView {
    let tracks = state
        .tracks
        .iter()
        .enumerate()
        .map(|(index, track)| TrackRow {
            index,
            title: track.title.clone(),
            active: index == state.active_track,
            info: track.info.clone(),
            downloads: track
                .download_urls()
                .iter()
                .map(|url| DownloadLink::from_url(url))
                .collect(),
        })
        .collect();

    let info = release
        .info
        .as_ref()
        .filter(|info| !info.trim().is_empty())
        .map(|info| Section {
            heading: labels.release_info.clone(),
            body: info.clone(),
        });

    let links = release
        .links
        .as_ref()
        .filter(|links| !links.is_empty())
        .map(|links| Section {
            heading: labels.release_links.clone(),
            body: links
                .iter()
                .map(|(label, url)| (label.to_string(), url.to_string()))
                .collect(),
        });

    let groups = credit_groups(&release.credits(), labels);
    let credits = (!groups.is_empty()).then(|| Section {
        heading: labels.credits.clone(),
        body: groups,
    });

    ReleaseView {
        title: release.title.clone(),
        cover: release.cover.clone(),
        is_playing: state.is_playing,
        is_loading: state.is_loading,
        tracks,
        info,
        links,
        credits,
    }
}

fn credit_groups(credits: &Credits, labels: &Labels) -> Vec<CreditGroup> {
    [
        (&labels.credits_engineering, &credits.engineering),
        (&labels.credits_performance, &credits.performance),
        (&labels.credits_production, &credits.production),
        (&labels.credits_writing, &credits.writing),
    ]
    .into_iter()
    .filter(|(_, names)| !names.is_empty())
    .map(|(label, names)| CreditGroup {
        label: label.clone(),
        names: names.join(", "),
    })
    .collect()
}

impl fmt::Display for ReleaseView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transport = if self.is_playing { "||" } else { "|>" };
        write!(f, "{transport} {}", self.title)?;
        if self.is_loading {
            write!(f, "  (loading...)")?;
        }
        writeln!(f)?;
        if !self.cover.is_empty() {
            writeln!(f, "   cover: {}", self.cover)?;
        }

        for row in &self.tracks {
            let marker = if row.active { '>' } else { ' ' };
            write!(f, "{marker} {:>2}. ", row.index + 1)?;
            if row.active {
                write!(f, "**{}**", row.title)?;
            } else {
                write!(f, "{}", row.title)?;
            }
            if !row.downloads.is_empty() {
                let labels: Vec<_> = row.downloads.iter().map(|d| d.label.as_str()).collect();
                write!(f, "  [{}]", labels.join(" "))?;
            }
            writeln!(f)?;
            if let Some(info) = &row.info {
                writeln!(f, "       \"{info}\"")?;
            }
        }

        if let Some(info) = &self.info {
            writeln!(f, "\n{}\n  {}", info.heading, info.body)?;
        }
        if let Some(links) = &self.links {
            writeln!(f, "\n{}", links.heading)?;
            for (label, url) in &links.body {
                writeln!(f, "  - {label}: {url}")?;
            }
        }
        if let Some(credits) = &self.credits {
            writeln!(f, "\n{}", credits.heading)?;
            for group in &credits.body {
                writeln!(f, "  {}: {}", group.label, group.names)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Links, Track};

    fn release(credits: Option<Credits>) -> Release {
        Release {
            title: "First EP".into(),
            cover: "ep.jpg".into(),
            credits,
            tracks: vec![
                Track {
                    title: "A".into(),
                    files: Some(vec!["media/a.mp3".into()]),
                    downloads: Some(vec!["dl/a.flac".into(), "dl/a.mp3".into()]),
                    ..Default::default()
                },
                Track {
                    title: "B".into(),
                    info: Some("Live take".into()),
                    files: Some(vec!["media/b.mp3".into()]),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    fn state(release: &Release, active_track: usize) -> PlayerState {
        PlayerState {
            active_track,
            is_playing: true,
            is_loading: false,
            tracks: release.tracks.clone(),
            quality: "default".into(),
        }
    }

    #[test]
    fn derives_download_names() {
        let link = DownloadLink::from_url("https://cdn.example/music/track.one.flac");
        assert_eq!(link.filename, "track.one.flac");
        assert_eq!(link.label, "FLAC");
    }

    #[test]
    fn emphasizes_only_active_track() {
        let release = release(None);
        let view = present(&state(&release, 1), &release, &Labels::default());
        let active: Vec<_> = view.tracks.iter().map(|row| row.active).collect();
        assert_eq!(active, vec![false, true]);
        assert!(view.to_string().contains("**B**"));
    }

    #[test]
    fn legacy_tracks_offer_files_for_download() {
        let release = release(None);
        let view = present(&state(&release, 0), &release, &Labels::default());
        let labels: Vec<_> = view.tracks[0].downloads.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["FLAC", "MP3"]);
        assert_eq!(view.tracks[1].downloads[0].filename, "b.mp3");
    }

    #[test]
    fn renders_only_non_empty_credit_groups() {
        let credits = Credits {
            writing: vec!["Ann".into(), "Bo".into()],
            engineering: vec!["Cy".into()],
            ..Default::default()
        };
        let release = release(Some(credits));
        let view = present(&state(&release, 0), &release, &Labels::default());
        let credits = view.credits.unwrap();
        assert_eq!(credits.heading, "Credits");
        assert_eq!(
            credits.body,
            vec![
                CreditGroup {
                    label: "Engineering".into(),
                    names: "Cy".into()
                },
                CreditGroup {
                    label: "Writing".into(),
                    names: "Ann, Bo".into()
                },
            ]
        );
    }

    #[test]
    fn absent_credits_match_empty_credits() {
        let absent = release(None);
        let empty = release(Some(Credits::default()));
        let labels = Labels::default();
        assert_eq!(
            present(&state(&absent, 0), &absent, &labels),
            present(&state(&empty, 0), &empty, &labels)
        );
        assert!(present(&state(&absent, 0), &absent, &labels).credits.is_none());
    }

    #[test]
    fn skips_empty_info_and_links() {
        let mut release = release(None);
        release.info = Some("  ".into());
        release.links = Some(Links::new());
        let view = present(&state(&release, 0), &release, &Labels::default());
        assert!(view.info.is_none());
        assert!(view.links.is_none());

        release.info = Some("Recorded in one night.".into());
        let mut links = Links::new();
        links.push("Bandcamp", "https://band.example");
        release.links = Some(links);
        let view = present(&state(&release, 0), &release, &Labels::default());
        assert_eq!(view.info.unwrap().body, "Recorded in one night.");
        assert_eq!(view.links.unwrap().body.len(), 1);
    }
}
