use crate::{
    engine::{RenderTarget, WaveformEngine},
    Catalogue, PlayerConfig, ReleasePlayer, Result, Selection, SidecarFetcher,
};

/// Keeps at most one [`ReleasePlayer`] mounted for the application's current
/// `(artist, release)` selection.
pub struct PlayerSession<E: WaveformEngine, F: SidecarFetcher + Clone> {
    config: PlayerConfig,
    target: RenderTarget,
    fetcher: F,
    player: Option<ReleasePlayer<E, F>>,
}

impl<E: WaveformEngine, F: SidecarFetcher + Clone> PlayerSession<E, F> {
    pub fn new(config: PlayerConfig, target: RenderTarget, fetcher: F) -> Self {
        Self {
            config,
            target,
            fetcher,
            player: None,
        }
    }

    pub fn player(&self) -> Option<&ReleasePlayer<E, F>> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut ReleasePlayer<E, F>> {
        self.player.as_mut()
    }

    /// Applies a selection change.
    ///
    /// The same pair again keeps the mounted player. Anything else unmounts
    /// it first; a blank or missing selection leaves nothing mounted. When
    /// mounting fails the session stays empty.
    pub fn select(&mut self, catalogue: &Catalogue, selection: Option<Selection>) -> Result<()> {
        let selection = selection.filter(|selection| !selection.is_blank());
        let current = self.player.as_ref().map(|player| player.selection());
        if current == selection.as_ref() {
            return Ok(());
        }

        if let Some(player) = self.player.take() {
            player.unmount();
        }

        if let Some(selection) = selection {
            let player = ReleasePlayer::mount(
                catalogue,
                selection,
                self.target.clone(),
                self.fetcher.clone(),
                &self.config,
            )?;
            self.player = Some(player);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        if let Some(player) = self.player.take() {
            player.unmount();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::{EngineCall, SimulatedEngine},
        NoSidecar,
    };
    use serde_json::json;

    fn catalogue() -> Catalogue {
        serde_json::from_value(json!({
            "band": {
                "releases": {
                    "ep": { "title": "EP", "tracks": [{ "title": "A", "files": ["a.mp3"] }] },
                    "lp": { "title": "LP", "tracks": [{ "title": "L", "files": ["l.mp3"] }] }
                }
            }
        }))
        .unwrap()
    }

    fn session() -> PlayerSession<SimulatedEngine, NoSidecar> {
        PlayerSession::new(
            PlayerConfig::default(),
            RenderTarget::new("waveform", 16),
            NoSidecar,
        )
    }

    #[test]
    fn remounts_on_selection_change() {
        let catalogue = catalogue();
        let mut session = session();
        session
            .select(&catalogue, Some(Selection::new("band", "ep")))
            .unwrap();
        let first = session.player().unwrap().engine().journal();

        session
            .select(&catalogue, Some(Selection::new("band", "ep")))
            .unwrap();
        assert_eq!(first.count(&EngineCall::Teardown), 0);

        session
            .select(&catalogue, Some(Selection::new("band", "lp")))
            .unwrap();
        assert_eq!(first.count(&EngineCall::Teardown), 1);
        assert_eq!(session.player().unwrap().release().title, "LP");
    }

    #[test]
    fn blank_selection_unmounts() {
        let catalogue = catalogue();
        let mut session = session();
        session
            .select(&catalogue, Some(Selection::new("band", "ep")))
            .unwrap();
        let journal = session.player().unwrap().engine().journal();

        session
            .select(&catalogue, Some(Selection::new("band", "")))
            .unwrap();
        assert!(session.player().is_none());
        assert_eq!(journal.count(&EngineCall::Teardown), 1);

        session.clear();
        assert_eq!(journal.count(&EngineCall::Teardown), 1);
    }

    #[test]
    fn whitespace_ids_are_looked_up() {
        let catalogue = catalogue();
        let mut session = session();
        let err = session
            .select(&catalogue, Some(Selection::new(" ", "ep")))
            .unwrap_err();
        assert!(matches!(err, crate::PlayerError::UnknownArtist(ref id) if id == " "));
        assert!(session.player().is_none());
    }

    #[test]
    fn failed_mount_leaves_session_empty() {
        let catalogue = catalogue();
        let mut session = session();
        session
            .select(&catalogue, Some(Selection::new("band", "ep")))
            .unwrap();
        assert!(session
            .select(&catalogue, Some(Selection::new("ghost", "ep")))
            .is_err());
        assert!(session.player().is_none());
    }
}
