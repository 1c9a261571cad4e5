use std::fs;
use std::path::{Path, PathBuf};

use leafweave_core::{MapComponent, RenderOptions, Scene, TemplateSource};
use tracing::debug;

use super::{io_report, report};

/// Command-line overrides applied on top of the scene's own options.
#[derive(Debug, Default)]
pub struct RenderArgs {
    pub key: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub container_width: bool,
    pub returned_objects: Vec<String>,
    /// Report no envelope fields at all.
    pub no_returned_objects: bool,
    pub hover: bool,
    pub pixelated: bool,
    pub max_drawn: Option<u32>,
    pub keep_old_drawn: bool,
    pub debug: bool,
    pub out: Option<PathBuf>,
}

impl RenderArgs {
    fn apply(&self, opts: &mut RenderOptions) {
        if let Some(key) = &self.key {
            opts.key = Some(key.clone());
        }
        if let Some(height) = self.height {
            opts.height = height;
        }
        if let Some(width) = self.width {
            opts.width = Some(width);
            opts.use_container_width = false;
        }
        if self.container_width {
            opts.use_container_width = true;
        }
        if self.no_returned_objects {
            opts.returned_objects = Some(Vec::new());
        } else if !self.returned_objects.is_empty() {
            opts.returned_objects = Some(self.returned_objects.clone());
        }
        opts.return_on_hover |= self.hover;
        opts.pixelated |= self.pixelated;
        opts.debug |= self.debug;
        if let Some(max) = self.max_drawn {
            opts.max_drawn_objects = max;
        }
        if self.keep_old_drawn {
            opts.max_drawn_objects_remove_old = false;
        }
    }
}

pub fn run(path: &Path, args: RenderArgs) -> Result<(), String> {
    let text = fs::read_to_string(path).map_err(|e| io_report("E_CLI_READ", path, &e))?;
    let loaded = Scene::from_json(&text)
        .and_then(Scene::build)
        .map_err(|e| report(&e))?;
    let mut opts = loaded.options;
    args.apply(&mut opts);
    debug!(scene = %path.display(), nodes = loaded.tree.len(), "loaded scene");

    let payload = MapComponent::new(&TemplateSource)
        .render(&loaded.tree, &opts)
        .map_err(|e| report(&e))?;
    let json = payload.to_json().map_err(|e| report(&e))?;

    match &args.out {
        Some(out) => {
            fs::write(out, format!("{}\n", json)).map_err(|e| io_report("E_CLI_WRITE", out, &e))?;
            println!("wrote {}", out.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
