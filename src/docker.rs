//! Container runtime cleanup: images, stopped containers, prune commands.

use std::io::{self, BufRead, Write};
use std::process::Command;

use thiserror::Error;

use crate::cleanup::confirm;

const IMAGE_FORMAT: &str = "{{.ID}}|{{.Repository}}|{{.Tag}}|{{.Size}}";
const CONTAINER_FORMAT: &str = "{{.ID}}|{{.Names}}|{{.Image}}|{{.Status}}";

/// Errors talking to the container runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// A stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub id: String,
    pub repository: String,
    pub tag: String,
    /// Size as printed by the runtime, e.g. `1.2GB`.
    pub size: String,
}

/// A container in any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
}

impl ContainerInfo {
    /// Whether the container is not running and can be pruned.
    pub fn is_stopped(&self) -> bool {
        self.status.starts_with("Exited") || self.status.starts_with("Created")
    }
}

/// Operations the cleanup flow needs from a container runtime.
pub trait ContainerRuntime {
    fn list_images(&self) -> Result<Vec<ImageInfo>, RuntimeError>;
    fn list_containers(&self) -> Result<Vec<ContainerInfo>, RuntimeError>;
    fn count_dangling_images(&self) -> Result<usize, RuntimeError>;
    fn prune_dangling_images(&self) -> Result<String, RuntimeError>;
    fn prune_stopped_containers(&self) -> Result<String, RuntimeError>;
    /// Human-readable disk usage summary.
    fn disk_usage(&self) -> Result<String, RuntimeError>;
    /// Remove all unused data.
    fn system_prune(&self) -> Result<String, RuntimeError>;
}

/// [`ContainerRuntime`] backed by the `docker` command line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl DockerCli {
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// Use a different client binary, such as `podman`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, RuntimeError> {
        tracing::debug!(program = %self.program, ?args, "running container runtime");
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| RuntimeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RuntimeError::Failed {
                command: format!("{} {}", self.program, args.join(" ")),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRuntime for DockerCli {
    fn list_images(&self) -> Result<Vec<ImageInfo>, RuntimeError> {
        self.run(&["images", "--format", IMAGE_FORMAT])
            .map(|out| parse_images(&out))
    }

    fn list_containers(&self) -> Result<Vec<ContainerInfo>, RuntimeError> {
        self.run(&["ps", "-a", "--format", CONTAINER_FORMAT])
            .map(|out| parse_containers(&out))
    }

    fn count_dangling_images(&self) -> Result<usize, RuntimeError> {
        let out = self.run(&["images", "-f", "dangling=true", "-q"])?;
        Ok(out.lines().filter(|l| !l.trim().is_empty()).count())
    }

    fn prune_dangling_images(&self) -> Result<String, RuntimeError> {
        self.run(&["image", "prune", "-f"])
    }

    fn prune_stopped_containers(&self) -> Result<String, RuntimeError> {
        self.run(&["container", "prune", "-f"])
    }

    fn disk_usage(&self) -> Result<String, RuntimeError> {
        self.run(&["system", "df"])
    }

    fn system_prune(&self) -> Result<String, RuntimeError> {
        self.run(&["system", "prune", "-f"])
    }
}

/// Split a `|`-separated line into exactly four fields.
fn four_fields(line: &str) -> Option<[&str; 4]> {
    let mut parts = line.split('|');
    let fields = [parts.next()?, parts.next()?, parts.next()?, parts.next()?];
    parts.next().is_none().then_some(fields)
}

/// Parse `docker images --format` output. Malformed lines are skipped.
pub fn parse_images(output: &str) -> Vec<ImageInfo> {
    output
        .lines()
        .filter_map(four_fields)
        .map(|[id, repository, tag, size]| ImageInfo {
            id: id.to_string(),
            repository: repository.to_string(),
            tag: tag.to_string(),
            size: size.to_string(),
        })
        .collect()
}

/// Parse `docker ps -a --format` output. Malformed lines are skipped.
pub fn parse_containers(output: &str) -> Vec<ContainerInfo> {
    output
        .lines()
        .filter_map(four_fields)
        .map(|[id, name, image, status]| ContainerInfo {
            id: id.to_string(),
            name: name.to_string(),
            image: image.to_string(),
            status: status.to_string(),
        })
        .collect()
}

/// Interactive runtime cleanup: list, then offer each prune in turn.
///
/// A listing failure is reported and the remaining steps still run.
pub fn run_cleanup<T, R, W>(runtime: &T, input: &mut R, output: &mut W, dry_run: bool) -> io::Result<()>
where
    T: ContainerRuntime + ?Sized,
    R: BufRead,
    W: Write,
{
    writeln!(output, "== Images ==")?;
    match runtime.list_images() {
        Ok(images) if images.is_empty() => writeln!(output, "No images found.")?,
        Ok(images) => {
            for (i, img) in images.iter().enumerate() {
                writeln!(output, "{:>3}. {} ({}:{})  {}", i + 1, img.id, img.repository, img.tag, img.size)?;
            }
            match runtime.count_dangling_images() {
                Ok(0) => {}
                Ok(dangling) => {
                    writeln!(output, "Found {dangling} dangling image(s)")?;
                    if confirm(input, output, "Remove dangling images?")? {
                        prune(output, dry_run, "image prune", || runtime.prune_dangling_images())?;
                    }
                }
                Err(e) => writeln!(output, "Could not count dangling images: {e}")?,
            }
        }
        Err(e) => writeln!(output, "Could not list images: {e}")?,
    }

    writeln!(output)?;
    writeln!(output, "== Containers ==")?;
    match runtime.list_containers() {
        Ok(containers) if containers.is_empty() => writeln!(output, "No containers found.")?,
        Ok(containers) => {
            for (i, c) in containers.iter().enumerate() {
                writeln!(output, "{:>3}. {} ({})  {}  {}", i + 1, c.id, c.name, c.image, c.status)?;
            }
            let stopped = containers.iter().filter(|c| c.is_stopped()).count();
            if stopped > 0 {
                writeln!(output, "Found {stopped} stopped container(s)")?;
                if confirm(input, output, "Remove stopped containers?")? {
                    prune(output, dry_run, "container prune", || runtime.prune_stopped_containers())?;
                }
            }
        }
        Err(e) => writeln!(output, "Could not list containers: {e}")?,
    }

    writeln!(output)?;
    writeln!(output, "== Disk usage ==")?;
    match runtime.disk_usage() {
        Ok(usage) => writeln!(output, "{}", usage.trim_end())?,
        Err(e) => writeln!(output, "Could not read disk usage: {e}")?,
    }

    writeln!(output)?;
    if confirm(input, output, "Run full system prune (removes all unused data)?")? {
        prune(output, dry_run, "system prune", || runtime.system_prune())?;
    }
    Ok(())
}

fn prune<W, F>(output: &mut W, dry_run: bool, what: &str, action: F) -> io::Result<()>
where
    W: Write,
    F: FnOnce() -> Result<String, RuntimeError>,
{
    if dry_run {
        return writeln!(output, "Would run {what}.");
    }
    match action() {
        Ok(out) => {
            tracing::info!(action = what, "runtime prune finished");
            writeln!(output, "{}", out.trim_end())
        }
        Err(e) => {
            tracing::warn!(action = what, error = %e, "runtime prune failed");
            writeln!(output, "{what} failed: {e}")
        }
    }
}
