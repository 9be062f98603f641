use clap::Parser;
use dvr_core::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dvrpost")]
#[command(
    author,
    version,
    about = "Post-process a DVR recording: mark or cut commercials, extract captions, and transcode"
)]
pub struct Cli {
    /// Recording to process
    #[arg(required_unless_present_any = ["sample_config", "check_tools"])]
    pub file: Option<PathBuf>,

    /// Hours during which no processing starts, as HH-HH (e.g. 22-06)
    #[arg(short, long, value_name = "HH-HH")]
    pub quiet_time: Option<String>,

    /// Process now even during quiet time
    #[arg(long)]
    pub ignore_quiet_time: bool,

    /// Keep the original recording after a successful run
    #[arg(long, overrides_with = "no_keep_original")]
    pub keep_original: bool,

    /// Delete the original recording after a successful run
    #[arg(long, overrides_with = "keep_original")]
    pub no_keep_original: bool,

    /// Keep the working directory for inspection
    #[arg(long)]
    pub keep_temp: bool,

    /// Video encoder passed to HandBrake (see `HandBrakeCLI --help`)
    #[arg(short, long)]
    pub encoder: Option<String>,

    /// Encoder preset passed to HandBrake (see `HandBrakeCLI --encoder-preset-list <encoder>`)
    #[arg(long)]
    pub encoder_preset: Option<String>,

    /// HandBrake presets file to import instead of the GUI presets
    #[arg(short = 'H', long, value_name = "FILE")]
    pub handbrake_presets_import: Option<PathBuf>,

    /// HandBrake preset to use
    #[arg(short = 'P', long, value_name = "NAME")]
    pub handbrake_preset_name: Option<String>,

    /// Skip commercial detection
    #[arg(long, hide = true)]
    pub bypass_comskip: bool,

    /// comskip configuration file
    #[arg(long, value_name = "FILE")]
    pub comskip_ini: Option<PathBuf>,

    /// Lock file shared by all jobs
    #[arg(long, value_name = "FILE")]
    pub lock_file: Option<PathBuf>,

    /// Parent directory for working directories
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// comskip binary location
    #[arg(long, value_name = "PATH")]
    pub comskip_location: Option<PathBuf>,

    /// comcut binary location
    #[arg(long, value_name = "PATH")]
    pub comcut_location: Option<PathBuf>,

    /// ccextractor binary location
    #[arg(long, value_name = "PATH")]
    pub ccextractor_location: Option<PathBuf>,

    /// ffmpeg binary location
    #[arg(long, value_name = "PATH")]
    pub ffmpeg_location: Option<PathBuf>,

    /// HandBrakeCLI binary location
    #[arg(long, value_name = "PATH")]
    pub handbrake_location: Option<PathBuf>,

    /// Print the resolved configuration as JSON and exit
    #[arg(long)]
    pub sample_config: bool,

    /// Check that the external tools are available and exit
    #[arg(long)]
    pub check_tools: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging, including periodic tool progress
    #[arg(short, long)]
    pub verbose: bool,

    /// Log every line of tool output
    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    /// Layer command-line values over the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref q) = self.quiet_time {
            config.quiet_time = Some(q.clone());
        }
        if self.ignore_quiet_time {
            config.ignore_quiet_time = true;
        }
        if self.keep_original {
            config.keep_original = true;
        }
        if self.no_keep_original {
            config.keep_original = false;
        }
        if self.keep_temp {
            config.keep_temp = true;
        }
        if self.bypass_comskip {
            config.bypass_comskip = true;
        }

        set(&mut config.encoder, &self.encoder);
        set(&mut config.encoder_preset, &self.encoder_preset);
        set(&mut config.handbrake_presets_import, &self.handbrake_presets_import);
        set(&mut config.handbrake_preset_name, &self.handbrake_preset_name);
        set(&mut config.comskip_ini, &self.comskip_ini);

        if let Some(ref p) = self.lock_file {
            config.lock_file = p.clone();
        }
        if let Some(ref p) = self.temp_dir {
            config.temp_dir = p.clone();
        }

        let tools = &mut config.tools;
        for (slot, value) in [
            (&mut tools.comskip, &self.comskip_location),
            (&mut tools.comcut, &self.comcut_location),
            (&mut tools.ccextractor, &self.ccextractor_location),
            (&mut tools.ffmpeg, &self.ffmpeg_location),
            (&mut tools.handbrake, &self.handbrake_location),
        ] {
            if let Some(p) = value {
                *slot = p.clone();
            }
        }
    }
}

fn set<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        slot.clone_from(value);
    }
}
