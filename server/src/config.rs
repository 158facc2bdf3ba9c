//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass die Installation ohne Konfigurationsdatei
//! lauffaehig ist. Ungueltige Werte werden schon beim Laden abgelehnt.

use dotfield_core::types::{ColorIndex, Rgb};
use dotfield_signaling::{InstallationConfig, Palette, SignalingError, SignalingResult};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Autopilot-Einstellungen
    pub autopilot: AutopilotEinstellungen,
    /// Farben und Raster
    pub palette: PaletteEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer beide Listener
    pub bind_adresse: String,
    /// Port fuer HTTP/WebSocket (Browser-Clients)
    pub web_port: u16,
    /// Port fuer die Cube-Verbindung
    pub cube_port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            web_port: 8080,
            cube_port: 9000,
        }
    }
}

/// Autopilot-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotEinstellungen {
    /// Synthetische Events pro Sekunde
    pub ereignisse_pro_sekunde: f64,
    /// Ruhezeit in Sekunden bis der Autopilot wieder anspringt
    pub leerlauf_sek: u64,
    /// Breite des rotierenden Farbfensters
    pub fensterbreite: usize,
    /// Takt der Paletten-Rotation in Millisekunden
    pub rotation_ms: u64,
    /// Palettenindizes fuer den Autopiloten (leer = ganze Palette)
    pub farbzuordnung: Option<Vec<ColorIndex>>,
}

impl Default for AutopilotEinstellungen {
    fn default() -> Self {
        Self {
            ereignisse_pro_sekunde: 10.0,
            leerlauf_sek: 30,
            fensterbreite: 3,
            rotation_ms: 5000,
            farbzuordnung: None,
        }
    }
}

/// Farben und Raster
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteEinstellungen {
    /// RGB-Tripel, Reihenfolge = Farbindex
    pub farben: Vec<Rgb>,
    /// Zellen pro Seitenkante
    pub raster_groesse: u32,
}

impl Default for PaletteEinstellungen {
    fn default() -> Self {
        Self {
            farben: Palette::standard().farben().to_vec(),
            raster_groesse: 8,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt und prueft die Konfiguration aus einer TOML-Datei.
    ///
    /// `None` wenn die Datei nicht existiert; der Aufrufer faellt dann auf
    /// die Standardwerte zurueck und meldet das, sobald das Logging steht.
    pub fn laden(pfad: &str) -> anyhow::Result<Option<Self>> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => Self::aus_toml(&inhalt)
                .map(Some)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Parst und prueft eine Konfiguration aus einem TOML-String
    pub fn aus_toml(inhalt: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(inhalt)?;
        config.installation_config()?;
        config.web_adresse()?;
        Ok(config)
    }

    /// Uebersetzt die Einstellungen in die Konfiguration der Installation
    ///
    /// # Fehler
    /// `Konfiguration` bei leerer Palette, Rate <= 0, Rotation 0, Raster 0
    /// oder einer Farbzuordnung ausserhalb der Palette.
    pub fn installation_config(&self) -> SignalingResult<InstallationConfig> {
        let config = InstallationConfig {
            palette: Palette::neu(self.palette.farben.clone())?,
            farbzuordnung: self.autopilot.farbzuordnung.clone(),
            fensterbreite: self.autopilot.fensterbreite,
            ereignisse_pro_sekunde: self.autopilot.ereignisse_pro_sekunde,
            leerlauf: Duration::from_secs(self.autopilot.leerlauf_sek),
            rotation: Duration::from_millis(self.autopilot.rotation_ms),
            raster_groesse: self.palette.raster_groesse,
        };
        config.pruefen()?;
        Ok(config)
    }

    fn bind_ip(&self) -> SignalingResult<IpAddr> {
        self.netzwerk.bind_adresse.parse().map_err(|_| {
            SignalingError::konfiguration(format!(
                "Ungueltige Bind-Adresse '{}'",
                self.netzwerk.bind_adresse
            ))
        })
    }

    /// Bind-Adresse fuer HTTP/WebSocket
    pub fn web_adresse(&self) -> SignalingResult<SocketAddr> {
        Ok(SocketAddr::new(self.bind_ip()?, self.netzwerk.web_port))
    }

    /// Bind-Adresse fuer die Cube-Verbindung
    pub fn cube_adresse(&self) -> SignalingResult<SocketAddr> {
        Ok(SocketAddr::new(self.bind_ip()?, self.netzwerk.cube_port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.netzwerk.web_port, 8080);
        assert_eq!(cfg.netzwerk.cube_port, 9000);
        assert_eq!(cfg.autopilot.leerlauf_sek, 30);
        assert_eq!(cfg.palette.farben.len(), 10);
        assert_eq!(cfg.logging.level, "info");

        let inst = cfg.installation_config().unwrap();
        assert_eq!(inst.rotation, Duration::from_secs(5));
        assert_eq!(inst.raster_groesse, 8);
    }

    #[test]
    fn bind_adressen() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.web_adresse().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.cube_adresse().unwrap().to_string(), "0.0.0.0:9000");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [netzwerk]
            web_port = 3000

            [autopilot]
            ereignisse_pro_sekunde = 2.5
            farbzuordnung = [0, 2, 4]

            [palette]
            farben = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [10, 10, 10], [1, 2, 3]]
        "#;
        let cfg = ServerConfig::aus_toml(toml).unwrap();
        assert_eq!(cfg.netzwerk.web_port, 3000);
        assert_eq!(cfg.autopilot.ereignisse_pro_sekunde, 2.5);
        assert_eq!(cfg.palette.farben[1], Rgb::new(0, 255, 0));
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.netzwerk.cube_port, 9000);
        assert_eq!(cfg.autopilot.fensterbreite, 3);
    }

    #[test]
    fn leere_palette_wird_abgelehnt() {
        let toml = r#"
            [palette]
            farben = []
        "#;
        assert!(ServerConfig::aus_toml(toml).is_err());
    }

    #[test]
    fn rate_null_wird_abgelehnt() {
        let toml = r#"
            [autopilot]
            ereignisse_pro_sekunde = 0.0
        "#;
        assert!(ServerConfig::aus_toml(toml).is_err());
    }

    #[test]
    fn farbzuordnung_ausserhalb_der_palette() {
        let toml = r#"
            [autopilot]
            farbzuordnung = [0, 42]
        "#;
        let err = ServerConfig::aus_toml(toml).unwrap_err();
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn ungueltige_bind_adresse() {
        let toml = r#"
            [netzwerk]
            bind_adresse = "irgendwo"
        "#;
        assert!(ServerConfig::aus_toml(toml).is_err());
    }

    #[test]
    fn winzige_und_riesige_rate_werden_abgelehnt() {
        for rate in ["1e-300", "1.7e308"] {
            let toml = format!("[autopilot]\nereignisse_pro_sekunde = {rate}\n");
            let err = ServerConfig::aus_toml(&toml).unwrap_err();
            assert!(err.to_string().contains("Tick-Periode"), "{rate}: {err}");
        }
    }

    #[test]
    fn fehlende_datei_ergibt_none() {
        let geladen = ServerConfig::laden("/gibt/es/nicht/dotfield.toml").unwrap();
        assert!(geladen.is_none());
    }

    #[test]
    fn vorhandene_datei_wird_geladen() {
        let pfad = std::env::temp_dir().join(format!("dotfield-{}.toml", std::process::id()));
        std::fs::write(&pfad, "[netzwerk]\nweb_port = 4242\n").unwrap();

        let geladen = ServerConfig::laden(pfad.to_str().unwrap());
        std::fs::remove_file(&pfad).unwrap();

        let cfg = geladen.unwrap().expect("Datei existiert");
        assert_eq!(cfg.netzwerk.web_port, 4242);
    }
}
