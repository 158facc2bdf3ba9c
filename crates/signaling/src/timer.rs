//! Zeitgeber-Abstraktion und Leerlauf-Timer
//!
//! Alle zeitgesteuerten Ablaeufe (Autopilot-Tick, Paletten-Rotation,
//! Leerlauf-Erkennung) laufen ueber einen `Zeitgeber`. Die Installation
//! verarbeitet die ausgeloesten `TimerSignal`s auf derselben Zeitlinie wie
//! die Client-Events.
//!
//! Pro `TimerArt` existiert hoechstens ein laufender Timer: erneutes Starten
//! ersetzt den alten. Jeder Start und jedes Stoppen erhoeht die Generation,
//! damit bereits eingereihte Signale eines abgebrochenen Timers als veraltet
//! erkannt werden.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Die drei Zeitgeber der Installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerArt {
    AutopilotTick,
    PalettenRotation,
    Leerlauf,
}

/// Ausgeloester Timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSignal {
    pub art: TimerArt,
    pub generation: u64,
}

/// Startet und stoppt periodische und einmalige Timer
pub trait Zeitgeber {
    /// Startet einen periodischen Timer; der erste Tick kommt nach `periode`
    fn periodisch_starten(&mut self, art: TimerArt, periode: Duration);

    /// Startet einen einmaligen Timer
    fn einmalig_starten(&mut self, art: TimerArt, verzoegerung: Duration);

    /// Stoppt den Timer dieser Art (No-op wenn keiner laeuft)
    fn stoppen(&mut self, art: TimerArt);

    /// Gehoert das Signal zum aktuell laufenden Timer seiner Art?
    fn ist_aktuell(&self, signal: &TimerSignal) -> bool;
}

// ---------------------------------------------------------------------------
// TokioZeitgeber
// ---------------------------------------------------------------------------

/// Zeitgeber auf Basis von tokio-Tasks
///
/// Jeder Timer ist ein eigener Task, der seine Signale in die Timer-Queue
/// der Installation schreibt. Muss innerhalb einer tokio-Runtime benutzt werden.
pub struct TokioZeitgeber {
    tx: mpsc::Sender<TimerSignal>,
    laufend: HashMap<TimerArt, (u64, JoinHandle<()>)>,
    generation: u64,
}

impl TokioZeitgeber {
    pub fn neu(tx: mpsc::Sender<TimerSignal>) -> Self {
        Self {
            tx,
            laufend: HashMap::new(),
            generation: 0,
        }
    }

    fn naechste_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

impl Zeitgeber for TokioZeitgeber {
    fn periodisch_starten(&mut self, art: TimerArt, periode: Duration) {
        self.stoppen(art);
        let generation = self.naechste_generation();
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            let mut intervall = tokio::time::interval_at(Instant::now() + periode, periode);
            intervall.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                intervall.tick().await;
                if tx.send(TimerSignal { art, generation }).await.is_err() {
                    break;
                }
            }
        });
        self.laufend.insert(art, (generation, handle));
    }

    fn einmalig_starten(&mut self, art: TimerArt, verzoegerung: Duration) {
        self.stoppen(art);
        let generation = self.naechste_generation();
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(verzoegerung).await;
            let _ = tx.send(TimerSignal { art, generation }).await;
        });
        self.laufend.insert(art, (generation, handle));
    }

    fn stoppen(&mut self, art: TimerArt) {
        if let Some((_, handle)) = self.laufend.remove(&art) {
            handle.abort();
        }
    }

    fn ist_aktuell(&self, signal: &TimerSignal) -> bool {
        self.laufend
            .get(&signal.art)
            .is_some_and(|(generation, _)| *generation == signal.generation)
    }
}

impl Drop for TokioZeitgeber {
    fn drop(&mut self) {
        for (_, (_, handle)) in self.laufend.drain() {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// VirtuellerZeitgeber
// ---------------------------------------------------------------------------

/// Zeitgeber ohne Uhr: merkt sich nur was laeuft
///
/// Signale werden vom Aufrufer mit `signal` erzeugt und von Hand zugestellt.
/// Zaehlt alle Starts, damit doppelte periodische Tasks auffallen.
#[derive(Debug, Default)]
pub struct VirtuellerZeitgeber {
    laufend: HashMap<TimerArt, (u64, Duration, bool)>,
    starts: HashMap<TimerArt, usize>,
    generation: u64,
}

impl VirtuellerZeitgeber {
    pub fn neu() -> Self {
        Self::default()
    }

    fn starten(&mut self, art: TimerArt, dauer: Duration, periodisch: bool) {
        self.generation += 1;
        self.laufend.insert(art, (self.generation, dauer, periodisch));
        *self.starts.entry(art).or_default() += 1;
    }

    /// Signal des laufenden Timers dieser Art (None wenn keiner laeuft)
    pub fn signal(&self, art: TimerArt) -> Option<TimerSignal> {
        self.laufend
            .get(&art)
            .map(|(generation, _, _)| TimerSignal {
                art,
                generation: *generation,
            })
    }

    pub fn laeuft(&self, art: TimerArt) -> bool {
        self.laufend.contains_key(&art)
    }

    /// Periode bzw. Verzoegerung des laufenden Timers
    pub fn dauer(&self, art: TimerArt) -> Option<Duration> {
        self.laufend.get(&art).map(|(_, dauer, _)| *dauer)
    }

    pub fn ist_periodisch(&self, art: TimerArt) -> bool {
        self.laufend.get(&art).is_some_and(|(_, _, p)| *p)
    }

    /// Wie oft ein Timer dieser Art bisher gestartet wurde
    pub fn starts(&self, art: TimerArt) -> usize {
        self.starts.get(&art).copied().unwrap_or(0)
    }
}

impl Zeitgeber for VirtuellerZeitgeber {
    fn periodisch_starten(&mut self, art: TimerArt, periode: Duration) {
        self.starten(art, periode, true);
    }

    fn einmalig_starten(&mut self, art: TimerArt, verzoegerung: Duration) {
        self.starten(art, verzoegerung, false);
    }

    fn stoppen(&mut self, art: TimerArt) {
        self.laufend.remove(&art);
    }

    fn ist_aktuell(&self, signal: &TimerSignal) -> bool {
        self.laufend
            .get(&signal.art)
            .is_some_and(|(generation, _, _)| *generation == signal.generation)
    }
}

// ---------------------------------------------------------------------------
// LeerlaufTimer
// ---------------------------------------------------------------------------

/// Feuert einmal, wenn fuer `schwelle` kein `zuruecksetzen` kam
///
/// Solange deaktiviert ist `zuruecksetzen` ein No-op. Es ist immer hoechstens
/// ein Leerlauf-Timer im Zeitgeber aktiv.
#[derive(Debug, Clone)]
pub struct LeerlaufTimer {
    schwelle: Duration,
    aktiviert: bool,
}

impl LeerlaufTimer {
    pub fn neu(schwelle: Duration) -> Self {
        Self {
            schwelle,
            aktiviert: false,
        }
    }

    pub fn schwelle(&self) -> Duration {
        self.schwelle
    }

    pub fn ist_aktiviert(&self) -> bool {
        self.aktiviert
    }

    /// Aktiviert den Timer und startet den Countdown
    pub fn aktivieren<Z: Zeitgeber + ?Sized>(&mut self, zeitgeber: &mut Z) {
        if self.aktiviert {
            return;
        }
        self.aktiviert = true;
        zeitgeber.einmalig_starten(TimerArt::Leerlauf, self.schwelle);
    }

    pub fn deaktivieren<Z: Zeitgeber + ?Sized>(&mut self, zeitgeber: &mut Z) {
        if !self.aktiviert {
            return;
        }
        self.aktiviert = false;
        zeitgeber.stoppen(TimerArt::Leerlauf);
    }

    /// Startet den Countdown neu (nur wenn aktiviert)
    pub fn zuruecksetzen<Z: Zeitgeber + ?Sized>(&mut self, zeitgeber: &mut Z) {
        if self.aktiviert {
            zeitgeber.einmalig_starten(TimerArt::Leerlauf, self.schwelle);
        }
    }

    /// Prueft ob ein Leerlauf-Signal tatsaechlich ausloest
    pub fn ausgeloest<Z: Zeitgeber + ?Sized>(&self, zeitgeber: &Z, signal: &TimerSignal) -> bool {
        signal.art == TimerArt::Leerlauf && self.aktiviert && zeitgeber.ist_aktuell(signal)
    }
}
