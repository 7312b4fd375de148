use std::{collections::BTreeMap, fmt, path::Path};

use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{PlayerError, Result};

/// Quality label every stream map is expected to carry.
pub const DEFAULT_QUALITY: &str = "default";

/// Full artist/release/track dataset driving the player.
///
/// Read-only to the player: the surrounding application owns it and hands
/// out shared references for the lifetime of a mount.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalogue {
    artists: BTreeMap<String, ArtistEntry>,
}

impl Catalogue {
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Artist ids in lexical order.
    pub fn artists(&self) -> impl Iterator<Item = &str> {
        self.artists.keys().map(String::as_str)
    }

    pub fn artist(&self, artist: &str) -> Result<&ArtistEntry> {
        self.artists
            .get(artist)
            .ok_or_else(|| PlayerError::UnknownArtist(artist.to_string()))
    }

    pub fn release(&self, artist: &str, release: &str) -> Result<&Release> {
        self.artist(artist)?
            .releases
            .get(release)
            .ok_or_else(|| PlayerError::UnknownRelease {
                artist: artist.to_string(),
                release: release.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtistEntry {
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub releases: BTreeMap<String, Release>,
}

/// One album or EP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Release {
    pub title: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<Credits>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Release {
    /// Credits with absent categories treated as empty.
    pub fn credits(&self) -> Credits {
        self.credits.clone().unwrap_or_default()
    }
}

/// Contributor names per credit category. Missing categories are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub writing: Vec<String>,
    #[serde(default)]
    pub performance: Vec<String>,
    #[serde(default)]
    pub production: Vec<String>,
    #[serde(default)]
    pub engineering: Vec<String>,
}

impl Credits {
    pub fn is_empty(&self) -> bool {
        self.writing.is_empty()
            && self.performance.is_empty()
            && self.production.is_empty()
            && self.engineering.is_empty()
    }
}

/// One audio item within a release.
///
/// Two schema variants coexist: a quality-keyed `stream` map and the legacy
/// flat `files` list. Both resolve through [`Track::resolve_source`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<Vec<String>>,
}

impl Track {
    /// Picks the single URL to hand to the engine.
    ///
    /// Order: `stream[quality]`, `stream["default"]`, `files[0]`.
    pub fn resolve_source(&self, quality: &str) -> Result<&str> {
        let stream = self.stream.as_ref();
        stream
            .and_then(|stream| stream.get(quality))
            .or_else(|| stream.and_then(|stream| stream.get(DEFAULT_QUALITY)))
            .or_else(|| self.files.as_ref().and_then(|files| files.first()))
            .map(String::as_str)
            .ok_or_else(|| PlayerError::NoPlayableSource(self.title.clone()))
    }

    /// URLs offered for download. Legacy tracks without a `downloads` list
    /// offer their `files`.
    pub fn download_urls(&self) -> &[String] {
        self.downloads
            .as_deref()
            .or(self.files.as_deref())
            .unwrap_or(&[])
    }
}

/// Label to URL pairs in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links(Vec<(String, String)>);

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, url: impl Into<String>) {
        self.0.push((label.into(), url.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(label, url)| (label.as_str(), url.as_str()))
    }
}

impl Serialize for Links {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for Links {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct LinksVisitor;

        impl<'de> Visitor<'de> for LinksVisitor {
            type Value = Links;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of link labels to URLs")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Links, A::Error> {
                let mut links = Links::new();
                while let Some((label, url)) = map.next_entry::<String, String>()? {
                    links.push(label, url);
                }
                Ok(links)
            }
        }

        deserializer.deserialize_map(LinksVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Parsed from text: `json!` sorts object keys, which would hide the
    // ordering of `links`.
    fn catalogue() -> Catalogue {
        Catalogue::from_json_str(
            r#"{
                "band": {
                    "bio": "Three people in a garage.",
                    "location": "Leeds",
                    "links": { "site": "https://band.example" },
                    "releases": {
                        "ep": {
                            "title": "First EP",
                            "cover": "ep.jpg",
                            "links": { "zeta": "z", "alpha": "a" },
                            "tracks": [
                                { "title": "A", "stream": { "default": "a.mp3", "hi": "a.flac" } },
                                { "title": "B", "files": ["b.mp3", "b.ogg"] }
                            ]
                        }
                    }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn looks_up_releases() {
        let catalogue = catalogue();
        let release = catalogue.release("band", "ep").unwrap();
        assert_eq!(release.title, "First EP");
        assert_eq!(release.tracks.len(), 2);
        assert_eq!(catalogue.artists().collect::<Vec<_>>(), vec!["band"]);
    }

    #[test]
    fn reports_unknown_selection() {
        let catalogue = catalogue();
        let err = catalogue.release("nobody", "ep").unwrap_err();
        assert!(matches!(err, PlayerError::UnknownArtist(ref id) if id == "nobody"));

        let err = catalogue.release("band", "lp").unwrap_err();
        assert!(format!("{err}").contains("lp"));
    }

    #[test]
    fn resolves_stream_quality_then_default() {
        let catalogue = catalogue();
        let track = &catalogue.release("band", "ep").unwrap().tracks[0];
        assert_eq!(track.resolve_source("hi").unwrap(), "a.flac");
        assert_eq!(track.resolve_source("lo").unwrap(), "a.mp3");
    }

    #[test]
    fn legacy_files_ignore_quality() {
        let catalogue = catalogue();
        let track = &catalogue.release("band", "ep").unwrap().tracks[1];
        assert_eq!(track.resolve_source("hi").unwrap(), "b.mp3");
        assert_eq!(track.download_urls(), ["b.mp3", "b.ogg"]);
    }

    #[test]
    fn stream_without_matching_label_falls_back_to_files() {
        let track = Track {
            title: "Mixed".into(),
            stream: Some(BTreeMap::from([("hi".to_string(), "m.flac".to_string())])),
            files: Some(vec!["m.mp3".into()]),
            ..Default::default()
        };
        assert_eq!(track.resolve_source("hi").unwrap(), "m.flac");
        assert_eq!(track.resolve_source("lo").unwrap(), "m.mp3");
    }

    #[test]
    fn track_without_sources_is_an_error() {
        let track = Track {
            title: "Silence".into(),
            ..Default::default()
        };
        let err = track.resolve_source(DEFAULT_QUALITY).unwrap_err();
        assert!(matches!(err, PlayerError::NoPlayableSource(ref title) if title == "Silence"));
        assert!(track.download_urls().is_empty());
    }

    #[test]
    fn links_keep_document_order() {
        let catalogue = catalogue();
        let links = catalogue.release("band", "ep").unwrap().links.clone().unwrap();
        let labels: Vec<_> = links.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["zeta", "alpha"]);
    }

    #[test]
    fn missing_credits_are_empty() {
        let catalogue = catalogue();
        let release = catalogue.release("band", "ep").unwrap();
        assert!(release.credits().is_empty());

        let partial: Credits = serde_json::from_value(json!({ "writing": ["Ann"] })).unwrap();
        assert_eq!(partial.writing, vec!["Ann"]);
        assert!(partial.engineering.is_empty());
    }
}
