//! Segue - Auto-DJ transition planner
//!
//! Analyzes tracks, suggests how to mix from one into the next and walks
//! whole playlists, recording every transition.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use segue_analysis::{AudioBuffer, SpectralAnalyzer, TrackAnalyzer, TransitionSuggestion};
use segue_engine::{AutoDj, AutoDjConfig, AutoDjConfigUpdate, CachedAnalysis, HistoryStats};
use segue_library::{file_fingerprint, AnalysisStore, StoredAnalysis, TrackLoader};
use segue_prefs::{
    EventBus, PreferenceEvent, Preferences, PreferencesStore, SettingsBridge, AUTODJ_EVENT,
};

#[derive(Parser, Debug)]
#[command(name = "segue", version, about = "Auto-DJ transition planner")]
struct Cli {
    /// Notch filter frequency in Hz for bass-heavy transitions
    #[arg(long, global = true)]
    notch_frequency: Option<f32>,

    /// Never suggest a notch filter
    #[arg(long, global = true)]
    no_notch: bool,

    /// Analysis database. Defaults to the user data directory.
    #[arg(long, global = true, value_parser = parse_path)]
    db: Option<PathBuf>,

    /// Preferences file. Defaults to the user config directory.
    #[arg(long, global = true, value_parser = parse_path)]
    prefs: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze tracks and print their features
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Suggest a transition between two tracks
    Suggest { current: PathBuf, next: PathBuf },
    /// Plan transitions through a playlist and record them
    Mix {
        #[arg(num_args = 2.., required = true)]
        files: Vec<PathBuf>,
    },
}

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(path))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("SEGUE_LOG")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    let prefs_path = cli.prefs.clone().unwrap_or_else(Preferences::config_path);
    let session = Session::open(&cli, &prefs_path)?;

    match &cli.command {
        Command::Analyze { files } => {
            for path in files {
                let (_, analysis) = session.ensure_analyzed(path)?;
                print_analysis(path, &analysis, cli.json)?;
            }
        }
        Command::Suggest { current, next } => {
            let suggestion = session.suggest(current, next)?;
            print_suggestion(current, next, &suggestion, cli.json)?;
        }
        Command::Mix { files } => {
            for pair in files.windows(2) {
                let suggestion = session.suggest(&pair[0], &pair[1])?;
                print_suggestion(&pair[0], &pair[1], &suggestion, cli.json)?;
                session.record(&pair[1], &suggestion);
            }
            print_stats(&session.dj.history_stats(), cli.json)?;

            if let Err(e) = session.prefs.snapshot().save_to(&prefs_path) {
                warn!(path = %prefs_path.display(), error = %e, "Failed to save preferences");
            }
        }
    }

    Ok(())
}

/// Everything one CLI invocation works with
struct Session {
    dj: AutoDj,
    loader: TrackLoader,
    store: Option<AnalysisStore>,
    prefs: Arc<PreferencesStore>,
    _bridge: SettingsBridge,
}

impl Session {
    fn open(cli: &Cli, prefs_path: &Path) -> Result<Self> {
        let initial = match &cli.prefs {
            Some(_) => Preferences::load_from(prefs_path).unwrap_or_else(|e| {
                warn!(path = %prefs_path.display(), error = %e, "Using default preferences");
                Preferences::default()
            }),
            None => Preferences::load(),
        };
        let prefs = Arc::new(PreferencesStore::new(initial));
        let bus = Arc::new(EventBus::new());
        let bridge = SettingsBridge::new(Arc::clone(&prefs), Arc::clone(&bus));
        bridge.init();
        let autodj_events = bus.subscribe(AUTODJ_EVENT);

        let mut config = AutoDjConfig::default();
        config.apply(&prefs.snapshot().auto_dj.to_config_update());
        let dj = AutoDj::init(
            || Ok(Arc::new(SpectralAnalyzer::default()) as Arc<dyn TrackAnalyzer>),
            config,
        )?;

        // Command line overrides reach the engine as autoDJ events
        prefs.update(|p| {
            if let Some(hz) = cli.notch_frequency {
                p.auto_dj.set_notch_frequency(hz);
            }
            if cli.no_notch {
                p.auto_dj.set_use_notch_filter(false);
            }
        });
        for event in autodj_events.try_iter() {
            if let PreferenceEvent::AutoDj(detail) = event {
                let config = dj.update_config(&AutoDjConfigUpdate {
                    use_notch_filter: Some(detail.use_notch_filter),
                    notch_frequency: Some(detail.notch_frequency),
                    prefer_harmonic: Some(detail.prefer_harmonic),
                    prefer_energy_match: Some(detail.prefer_energy_match),
                    ..Default::default()
                });
                debug!(?config, "Applied Auto-DJ preferences");
            }
        }

        let db_path = cli.db.clone().unwrap_or_else(default_db_path);
        let store = match AnalysisStore::open(&db_path) {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(path = %db_path.display(), error = %e, "Analysis store unavailable");
                None
            }
        };

        Ok(Self {
            dj,
            loader: TrackLoader::default(),
            store,
            prefs,
            _bridge: bridge,
        })
    }

    /// Analysis of `path`, from memory, the store or a fresh decode
    fn ensure_analyzed(&self, path: &Path) -> Result<(String, Arc<CachedAnalysis>)> {
        let id = track_id(path);
        if let Some(hit) = self.dj.analysis(&id) {
            return Ok((id, hit));
        }

        let fingerprint = file_fingerprint(path);
        if let (Some(store), Some((size, modified))) = (&self.store, fingerprint) {
            match store.get_fresh(&id, size, modified) {
                Ok(Some(stored)) => {
                    debug!(track = %id, "Restored analysis from store");
                    let entry = self.dj.cache().insert(
                        &id,
                        CachedAnalysis::with_timestamp(
                            stored.features.clone(),
                            stored.duration_secs,
                            stored.analyzed_at_time(),
                        ),
                    );
                    return Ok((id, entry));
                }
                Ok(None) => {}
                Err(e) => warn!(track = %id, error = %e, "Ignoring stored analysis"),
            }
        }

        let track = self
            .loader
            .load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        let entry = self
            .dj
            .analyze_track(&id, &track.buffer)
            .with_context(|| format!("Failed to analyze {}", path.display()))?;
        info!(track = %id, bpm = entry.features.bpm, key = %entry.features.camelot_key, "Analyzed track");

        if let Some(store) = &self.store {
            let stored = StoredAnalysis {
                title: track.metadata.title,
                artist: track.metadata.artist,
                ..StoredAnalysis::new(&id, entry.features.clone(), entry.duration)
            }
            .with_fingerprint(path);
            if let Err(e) = store.store(&stored) {
                warn!(track = %id, error = %e, "Failed to persist analysis");
            }
        }

        Ok((id, entry))
    }

    fn suggest(&self, current: &Path, next: &Path) -> Result<TransitionSuggestion> {
        let (current_id, _) = self.ensure_analyzed(current)?;
        let (next_id, _) = self.ensure_analyzed(next)?;

        // Both tracks are cached now, so no audio has to be handed over
        match self.dj.transition(&current_id, &next_id, &AudioBuffer::default()) {
            Some(suggestion) => Ok(suggestion),
            None => match self.dj.last_error() {
                Some(e) => Err(e).context("No transition suggestion"),
                None => bail!("No transition suggestion"),
            },
        }
    }

    fn record(&self, next: &Path, suggestion: &TransitionSuggestion) {
        let record = self.dj.record_transition(&track_id(next), suggestion);
        self.prefs.update(|p| p.auto_dj.record_transition(record));
    }
}

fn track_id(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("segue")
        .join("analyses.db")
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_analysis(path: &Path, analysis: &CachedAnalysis, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis.features)?);
        return Ok(());
    }

    let f = &analysis.features;
    println!("{}", display_name(path));
    println!("  BPM:        {:.1} ({:.0}%)", f.bpm, f.bpm_confidence * 100.0);
    println!("  Key:        {} / {} ({:.0}%)", f.key, f.camelot_key, f.key_confidence * 100.0);
    println!("  Energy:     {:.3} RMS, {:.1} dB", f.rms_energy, f.loudness);
    println!("  Bass/Mid:   {:.2}", f.bass_mid_ratio);
    println!("  Mix in/out: {:.1}s / {:.1}s", f.mix_in_point, f.mix_out_point);
    println!(
        "  Structure:  intro {:.1}-{:.1}s, outro {:.1}-{:.1}s",
        analysis.structure.intro_start,
        analysis.structure.intro_end,
        analysis.structure.outro_start,
        analysis.structure.outro_end
    );
    println!("  Genre:      {} ({:.0}%)", analysis.genre.primary_genre, analysis.genre.genre_confidence * 100.0);
    Ok(())
}

fn print_suggestion(current: &Path, next: &Path, s: &TransitionSuggestion, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(s)?);
        return Ok(());
    }

    println!("{} -> {}", display_name(current), display_name(next));
    println!("  Type:        {} ({:.0}% compatible)", s.transition_type, s.compatibility_score * 100.0);
    println!("  Harmonic:    {:.2}", s.harmonic_compatibility);
    println!("  Energy:      {:.2}", s.energy_match);
    println!("  Mix out/in:  {:.1}s / {:.1}s", s.mix_out_point, s.mix_in_point);
    println!("  Crossfade:   {:.1}s", s.crossfade_duration);
    println!("  FX:          {}", s.fx_recommendation);
    Ok(())
}

fn print_stats(stats: &HistoryStats, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    println!("Transitions: {}", stats.total_transitions);
    println!(
        "  harmonic {}, energy {}, tempo {}, standard {}",
        stats.harmonic_mix_count,
        stats.energy_mix_count,
        stats.tempo_change_count,
        stats.standard_mix_count
    );
    println!("  average compatibility {:.2}", stats.average_compatibility);
    println!("  variety {:.2}", stats.variety_score);
    Ok(())
}
