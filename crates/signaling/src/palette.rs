//! Farbpalette und rotierendes Autopilot-Fenster
//!
//! Die Palette ist nach dem Start unveraenderlich und wird von allen Sessions
//! und vom Autopilot gemeinsam gelesen. Der Autopilot waehlt seine Farben aus
//! einem kleinen Fenster seiner Farbzuordnung; der Fensteranfang
//! (`PaletteOffset`) wandert in festem Takt weiter, unabhaengig davon ob der
//! Autopilot gerade aktiv ist.

use dotfield_core::types::{ColorIndex, Rgb};
use rand::Rng;

use crate::error::{SignalingError, SignalingResult};

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Geordnete, nicht-leere Liste von Farben
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    farben: Vec<Rgb>,
}

impl Palette {
    pub fn neu(farben: Vec<Rgb>) -> SignalingResult<Self> {
        if farben.is_empty() {
            return Err(SignalingError::konfiguration("Palette darf nicht leer sein"));
        }
        Ok(Self { farben })
    }

    /// Standardpalette mit zehn Farben
    pub fn standard() -> Self {
        Self {
            farben: STANDARD_FARBEN.to_vec(),
        }
    }

    pub fn farben(&self) -> &[Rgb] {
        &self.farben
    }

    pub fn len(&self) -> usize {
        self.farben.len()
    }

    pub fn is_empty(&self) -> bool {
        self.farben.is_empty()
    }
}

const STANDARD_FARBEN: [Rgb; 10] = [
    Rgb::new(255, 0, 0),
    Rgb::new(255, 127, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(0, 255, 255),
    Rgb::new(0, 0, 255),
    Rgb::new(139, 0, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(255, 255, 255),
    Rgb::new(255, 105, 180),
];

// ---------------------------------------------------------------------------
// PaletteOffset
// ---------------------------------------------------------------------------

/// Index in `[0, laenge)`, der beim Weiterschalten umlaeuft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteOffset {
    wert: usize,
    laenge: usize,
}

impl PaletteOffset {
    /// `laenge` muss groesser als 0 sein
    pub fn neu(laenge: usize) -> Self {
        Self {
            wert: 0,
            laenge: laenge.max(1),
        }
    }

    pub fn wert(&self) -> usize {
        self.wert
    }

    /// Schaltet um eins weiter, mit Umlauf
    pub fn weiter(&mut self) -> usize {
        self.wert = (self.wert + 1) % self.laenge;
        self.wert
    }
}

// ---------------------------------------------------------------------------
// AutopilotFarben
// ---------------------------------------------------------------------------

/// Farbauswahl des Autopiloten
#[derive(Debug, Clone)]
pub struct AutopilotFarben {
    /// Palettenindizes in der Reihenfolge in der der Autopilot sie durchlaeuft
    zuordnung: Vec<ColorIndex>,
    fensterbreite: usize,
    offset: PaletteOffset,
}

impl AutopilotFarben {
    /// Prueft dass Zuordnung nicht leer ist und nur gueltige Palettenindizes enthaelt
    pub fn neu(
        zuordnung: Vec<ColorIndex>,
        fensterbreite: usize,
        palette: &Palette,
    ) -> SignalingResult<Self> {
        if zuordnung.is_empty() {
            return Err(SignalingError::konfiguration(
                "Autopilot-Farbzuordnung darf nicht leer sein",
            ));
        }
        if let Some(ungueltig) = zuordnung.iter().find(|i| **i >= palette.len()) {
            return Err(SignalingError::konfiguration(format!(
                "Autopilot-Farbzuordnung verweist auf Farbe {ungueltig}, Palette hat nur {}",
                palette.len()
            )));
        }
        if fensterbreite == 0 {
            return Err(SignalingError::konfiguration(
                "Autopilot-Fensterbreite muss groesser als 0 sein",
            ));
        }
        let offset = PaletteOffset::neu(zuordnung.len());
        Ok(Self {
            zuordnung,
            fensterbreite,
            offset,
        })
    }

    /// Identische Zuordnung ueber die ganze Palette
    pub fn ueber_palette(palette: &Palette, fensterbreite: usize) -> SignalingResult<Self> {
        Self::neu((0..palette.len()).collect(), fensterbreite, palette)
    }

    /// Waehlt eine zufaellige Farbe aus dem aktuellen Fenster
    pub fn farbe_waehlen<R: Rng + ?Sized>(&self, rng: &mut R) -> ColorIndex {
        let position = (rng.gen_range(0..self.fensterbreite) + self.offset.wert())
            % self.zuordnung.len();
        self.zuordnung[position]
    }

    /// Verschiebt das Fenster um eine Position
    pub fn rotieren(&mut self) -> usize {
        self.offset.weiter()
    }

    pub fn offset(&self) -> PaletteOffset {
        self.offset
    }

    /// Alle Farben die im aktuellen Fenster liegen
    pub fn fenster(&self) -> Vec<ColorIndex> {
        (0..self.fensterbreite)
            .map(|i| self.zuordnung[(i + self.offset.wert()) % self.zuordnung.len()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn leere_palette_wird_abgelehnt() {
        assert!(Palette::neu(vec![]).is_err());
        assert_eq!(Palette::standard().len(), 10);
    }

    #[test]
    fn offset_laeuft_um() {
        let mut offset = PaletteOffset::neu(3);
        let start = offset.wert();
        offset.weiter();
        offset.weiter();
        assert_ne!(offset.wert(), start);
        offset.weiter();
        assert_eq!(offset.wert(), start);
    }

    #[test]
    fn offset_bleibt_gueltig() {
        let mut offset = PaletteOffset::neu(4);
        for _ in 0..100 {
            assert!(offset.weiter() < 4);
        }
    }

    #[test]
    fn zuordnung_mit_ungueltigem_index() {
        let palette = Palette::standard();
        let err = AutopilotFarben::neu(vec![0, 10], 3, &palette).unwrap_err();
        assert!(err.to_string().contains("Farbe 10"));
        assert!(AutopilotFarben::neu(vec![], 3, &palette).is_err());
        assert!(AutopilotFarben::neu(vec![1], 0, &palette).is_err());
    }

    #[test]
    fn farbe_kommt_aus_dem_fenster() {
        let palette = Palette::standard();
        let mut farben = AutopilotFarben::neu(vec![9, 8, 7, 6, 5], 3, &palette).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        farben.rotieren();
        farben.rotieren();
        farben.rotieren();
        let fenster = farben.fenster();
        assert_eq!(fenster, vec![6, 5, 9]);

        for _ in 0..200 {
            assert!(fenster.contains(&farben.farbe_waehlen(&mut rng)));
        }
    }

    #[test]
    fn rotation_kehrt_zum_start_zurueck() {
        let palette = Palette::standard();
        let mut farben = AutopilotFarben::neu(vec![0, 1, 2], 1, &palette).unwrap();
        let start = farben.offset().wert();
        for _ in 0..3 {
            farben.rotieren();
        }
        assert_eq!(farben.offset().wert(), start);
    }
}
