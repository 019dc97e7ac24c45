//! Generator host.
//!
//! The host owns:
//! - The live `PyramidSpec`, replaced wholesale on every regeneration
//! - The metrics computed for it, reported once per regeneration
//! - A console whose cvars override the loaded configuration
//! - Key bindings for the regeneration trigger
//!
//! It exposes the two entry points an embedding application needs:
//! [`PyramidGenerator::on_regenerate`] and
//! [`PyramidGenerator::on_render_request`].

use anyhow::{bail, Context};
use pyramid_shared::{
    basis,
    config::{GeneratorConfig, V3_FRAC_RANGE},
    console::{parse_command_line, Console, CvarFlags, CvarValue},
    metrics::{compute_metrics, PyramidMetrics},
    pyramid::PyramidSpec,
    render::{draw_pyramid, Palette, RenderBackend},
    report::{report_lines, report_metrics, MetricsSink, TracingSink},
    wireframe::{compute_wireframe, Wireframe},
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

use crate::input::{InputEvent, KeyBindings};

const CVAR_V3_FRAC: &str = "pyr_v3_frac";
const CVAR_LEN_MIN: &str = "pyr_len_min";
const CVAR_LEN_MAX: &str = "pyr_len_max";
const CVAR_SHOW_RAYS: &str = "pyr_show_rays";
const CVAR_STEPS: &str = "pyr_steps";

/// Nested `press` commands allowed before a key dispatch is refused.
const MAX_PRESS_DEPTH: usize = 8;

/// Bounds for the seed length cvars.
const LENGTH_BOUNDS: (f64, f64) = (0.01, 1000.0);

/// High-level pyramid generator host.
pub struct PyramidGenerator {
    pub console: Console,
    pub bindings: KeyBindings,
    pub palette: Palette,

    config: GeneratorConfig,
    rng: StdRng,
    spec: PyramidSpec,
    metrics: PyramidMetrics,
    sink: Box<dyn MetricsSink>,

    regenerations: u64,
    frames: u64,
    quit_requested: bool,
}

impl PyramidGenerator {
    /// Creates a host with no geometry yet. Call [`Self::on_regenerate`] to build the first pyramid.
    pub fn new(config: &GeneratorConfig) -> anyhow::Result<Self> {
        config.validate().context("generator config")?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut console = Console::new();
        Self::register_cvars(&mut console, config)?;

        Ok(Self {
            console,
            bindings: KeyBindings::with_regen_key(&config.regen_key),
            palette: Palette::default(),
            config: config.clone(),
            rng,
            spec: PyramidSpec::EMPTY,
            metrics: PyramidMetrics::default(),
            sink: Box::new(TracingSink),
            regenerations: 0,
            frames: 0,
            quit_requested: false,
        })
    }

    /// Replaces the metrics sink.
    pub fn with_sink(mut self, sink: impl MetricsSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    fn register_cvars(console: &mut Console, cfg: &GeneratorConfig) -> anyhow::Result<()> {
        console.register_cvar(
            CVAR_V3_FRAC,
            CvarValue::Float(cfg.v3_frac as f64),
            "Base length to step height ratio",
            CvarFlags::ARCHIVE,
        );
        console.set_bounds(
            CVAR_V3_FRAC,
            *V3_FRAC_RANGE.start() as f64,
            *V3_FRAC_RANGE.end() as f64,
        )?;
        console.register_cvar(
            CVAR_LEN_MIN,
            CvarValue::Float(cfg.seed_length_min as f64),
            "Minimum random base length",
            CvarFlags::ARCHIVE,
        );
        console.set_bounds(CVAR_LEN_MIN, LENGTH_BOUNDS.0, LENGTH_BOUNDS.1)?;
        console.register_cvar(
            CVAR_LEN_MAX,
            CvarValue::Float(cfg.seed_length_max as f64),
            "Maximum random base length",
            CvarFlags::ARCHIVE,
        );
        console.set_bounds(CVAR_LEN_MAX, LENGTH_BOUNDS.0, LENGTH_BOUNDS.1)?;
        console.register_cvar(
            CVAR_SHOW_RAYS,
            CvarValue::Bool(cfg.show_rays),
            "Draw v1/v2/v3 debug rays",
            CvarFlags::ARCHIVE,
        );
        console.register_cvar(
            CVAR_STEPS,
            CvarValue::Int(0),
            "Step count of the current pyramid",
            CvarFlags::READ_ONLY,
        );
        Ok(())
    }

    /// The loaded configuration with console overrides applied.
    pub fn effective_config(&self) -> GeneratorConfig {
        let mut cfg = self.config.clone();
        if let Some(v) = self.console.get_float(CVAR_V3_FRAC) {
            cfg.v3_frac = v as f32;
        }
        if let Some(v) = self.console.get_float(CVAR_LEN_MIN) {
            cfg.seed_length_min = v as f32;
        }
        if let Some(v) = self.console.get_float(CVAR_LEN_MAX) {
            cfg.seed_length_max = v as f32;
        }
        if let Some(v) = self.console.get_cvar(CVAR_SHOW_RAYS) {
            cfg.show_rays = v.as_bool();
        }
        cfg
    }

    /// Builds a new pyramid and reports its metrics.
    pub fn on_regenerate(&mut self) -> &PyramidMetrics {
        let cfg = self.effective_config();
        let spec = basis::generate(&mut self.rng, &cfg, self.spec.v1);
        self.install_spec(spec)
    }

    /// Installs `spec` as the live pyramid, replacing the previous one.
    pub fn install_spec(&mut self, spec: PyramidSpec) -> &PyramidMetrics {
        self.spec = spec;
        self.metrics = compute_metrics(&self.spec);
        self.regenerations += 1;

        if let Err(e) = self
            .console
            .force_cvar(CVAR_STEPS, CvarValue::Int(i64::from(self.spec.step_count)))
        {
            warn!(error = %e, "Failed to publish step count");
        }

        if self.metrics.is_empty() {
            warn!(regeneration = self.regenerations, "Degenerate pyramid, nothing to measure");
        } else {
            info!(
                regeneration = self.regenerations,
                steps = self.spec.step_count,
                base_length = self.spec.v1.length(),
                step_height = self.spec.step_height(),
                total_volume = self.metrics.total_volume,
                "Pyramid regenerated"
            );
            report_metrics(&self.metrics, &mut *self.sink);
        }
        &self.metrics
    }

    /// Draws one frame into `backend`. Returns the number of segments drawn.
    pub fn on_render_request(&mut self, backend: &mut dyn RenderBackend) -> usize {
        let show_rays = self
            .console
            .get_cvar(CVAR_SHOW_RAYS)
            .map(|v| v.as_bool())
            .unwrap_or(self.config.show_rays);

        backend.begin_frame();
        let drawn = draw_pyramid(backend, &self.spec, self.config.origin(), &self.palette, show_rays);
        backend.end_frame();
        self.frames += 1;
        drawn
    }

    /// Wireframe of the live pyramid.
    pub fn segments(&self) -> Wireframe {
        compute_wireframe(&self.spec, self.config.origin())
    }

    pub fn spec(&self) -> &PyramidSpec {
        &self.spec
    }

    pub fn metrics(&self) -> &PyramidMetrics {
        &self.metrics
    }

    /// Text metrics for display.
    pub fn metric_lines(&self) -> Vec<String> {
        report_lines(&self.metrics).iter().map(|l| l.to_string()).collect()
    }

    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Dispatches one input event.
    pub fn handle_input(&mut self, event: InputEvent) -> anyhow::Result<Vec<String>> {
        match event {
            InputEvent::Key(key) => self.press_key(&key, 0),
            InputEvent::Command(line) => self.exec_console(&line),
        }
    }

    fn press_key(&mut self, key: &str, depth: usize) -> anyhow::Result<Vec<String>> {
        if depth > MAX_PRESS_DEPTH {
            bail!("key '{}' nests presses deeper than {}", key, MAX_PRESS_DEPTH);
        }
        let Some(command) = self.bindings.command_for(key).map(str::to_string) else {
            debug!(key = %key, "Unbound key");
            return Ok(Vec::new());
        };
        debug!(key = %key, command = %command, "Key press");
        self.run_line(&command, depth)
    }

    /// Executes a console command.
    pub fn exec_console(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        self.run_line(line, 0)
    }

    fn run_line(&mut self, line: &str, depth: usize) -> anyhow::Result<Vec<String>> {
        let line = line.trim();
        let tokens = parse_command_line(line);
        let Some(cmd) = tokens.first() else {
            return Ok(Vec::new());
        };

        match cmd.as_str() {
            "regen" => {
                let metrics = self.on_regenerate();
                if metrics.is_empty() {
                    return Ok(vec!["Degenerate pyramid generated".to_string()]);
                }
                let mut out = vec![format!("Generated {} steps", self.spec.step_count)];
                out.extend(self.metric_lines());
                Ok(out)
            }
            "status" => {
                let spec = &self.spec;
                let mut out = Vec::new();
                out.push(format!("Regenerations: {}", self.regenerations));
                out.push(format!("Frames: {}", self.frames));
                out.push(format!("Steps: {}", spec.step_count));
                out.push(format!(
                    "|v1| = {:.3}  |v2| = {:.3}  |v3| = {:.3}",
                    spec.v1.length(),
                    spec.v2.length(),
                    spec.v3.length()
                ));
                out.push(format!("Segments: {}", self.segments().len()));
                Ok(out)
            }
            "metrics" => {
                let lines = self.metric_lines();
                if lines.is_empty() {
                    return Ok(vec!["No pyramid".to_string()]);
                }
                Ok(lines)
            }
            "bind" => {
                if tokens.len() < 3 {
                    bail!("usage: bind <key> <command>");
                }
                let command = tokens[2..].join(" ");
                self.bindings.bind(&tokens[1], &command)?;
                Ok(vec![format!("{} -> {}", tokens[1], command)])
            }
            "unbind" => {
                if tokens.len() < 2 {
                    bail!("usage: unbind <key>");
                }
                match self.bindings.unbind(&tokens[1]) {
                    Some(_) => Ok(vec![format!("{} unbound", tokens[1])]),
                    None => Ok(vec![format!("{} is not bound", tokens[1])]),
                }
            }
            "binds" => Ok(self
                .bindings
                .iter()
                .map(|(k, c)| format!("  {} -> {}", k, c))
                .collect()),
            "press" => {
                if tokens.len() < 2 {
                    bail!("usage: press <key>");
                }
                self.press_key(&tokens[1], depth + 1)
            }
            "quit" | "exit" => {
                self.quit_requested = true;
                Ok(vec!["Quitting".to_string()])
            }
            _ => {
                // Delegate to console system.
                self.console.exec(line)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyramid_shared::{math::Vec3, render::FrameRecorder};

    fn seeded() -> PyramidGenerator {
        let cfg = GeneratorConfig {
            seed: Some(1234),
            ..GeneratorConfig::default()
        };
        PyramidGenerator::new(&cfg).unwrap()
    }

    #[test]
    fn starts_without_geometry() {
        let mut host = seeded();
        assert!(host.spec().is_degenerate());
        let mut rec = FrameRecorder::default();
        assert_eq!(host.on_render_request(&mut rec), 0);
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn regenerate_installs_new_spec() {
        let mut host = seeded();
        let steps = host.on_regenerate().steps.len();
        assert_eq!(steps, host.spec().step_count as usize);
        assert_eq!(host.console.get_cvar("pyr_steps"), Some(CvarValue::Int(steps as i64)));
        assert_eq!(host.segments().len(), steps * 12);
        assert_eq!(host.regenerations(), 1);
    }

    #[test]
    fn install_spec_replaces_metrics() {
        let mut host = seeded();
        let spec = PyramidSpec::from_vectors(
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(0.0, 6.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        );
        let total = host.install_spec(spec).total_volume;
        assert!((total - 56.0).abs() < 1e-9);
        assert_eq!(host.metric_lines().len(), 4);
    }

    #[test]
    fn bound_key_triggers_regeneration() {
        let mut host = seeded();
        let out = host.handle_input(InputEvent::Key("r".to_string())).unwrap();
        assert!(out[0].starts_with("Generated"));
        assert_eq!(host.regenerations(), 1);

        host.exec_console("bind g regen").unwrap();
        host.exec_console("press g").unwrap();
        assert_eq!(host.regenerations(), 2);
    }

    #[test]
    fn v3_frac_cvar_changes_step_count() {
        let mut host = seeded();
        host.exec_console("pyr_v3_frac 40").unwrap();
        assert_eq!(host.effective_config().v3_frac, 40.0);
        host.on_regenerate();
        assert_eq!(host.spec().step_count, 20);
    }

    #[test]
    fn quit_sets_flag() {
        let mut host = seeded();
        assert!(!host.quit_requested());
        host.exec_console("quit").unwrap();
        assert!(host.quit_requested());
    }

    #[test]
    fn non_finite_length_is_rejected_and_regen_still_works() {
        let mut host = seeded();
        assert!(host.exec_console("pyr_len_min nan").is_err());
        assert!(host.exec_console("pyr_len_max inf").is_err());
        assert_eq!(host.effective_config().seed_length_min, 3.0);

        let out = host.exec_console("regen").unwrap();
        assert!(out[0].starts_with("Generated"));
        assert_eq!(host.regenerations(), 1);
    }

    #[test]
    fn self_referencing_binding_is_an_error() {
        let mut host = seeded();
        host.exec_console("bind x press x").unwrap();
        assert!(host.exec_console("press x").is_err());
        assert!(host.handle_input(InputEvent::Key("x".to_string())).is_err());

        host.exec_console("bind a press b").unwrap();
        host.exec_console("bind b press a").unwrap();
        assert!(host.exec_console("press a").is_err());
        assert_eq!(host.regenerations(), 0);
    }

    #[test]
    fn chained_press_reaches_regen() {
        let mut host = seeded();
        host.exec_console("bind a press r").unwrap();
        host.exec_console("press a").unwrap();
        assert_eq!(host.regenerations(), 1);
    }

    #[test]
    fn quoted_bind_stores_unquoted_command() {
        let mut host = seeded();
        let out = host.exec_console(r#"bind g "regen""#).unwrap();
        assert_eq!(out, vec!["g -> regen".to_string()]);
        assert_eq!(host.bindings.command_for("g"), Some("regen"));
        host.exec_console("press g").unwrap();
        assert_eq!(host.regenerations(), 1);

        host.exec_console(r#"bind f "pyr_v3_frac 40""#).unwrap();
        host.exec_console("press f").unwrap();
        assert_eq!(host.effective_config().v3_frac, 40.0);
    }

    #[test]
    fn bad_bind_is_an_error() {
        let mut host = seeded();
        assert!(host.exec_console("bind r").is_err());
        assert!(host.exec_console("set pyr_steps 9").is_err());
    }
}
