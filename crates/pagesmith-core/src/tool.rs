//! External document-tool invocation.
//!
//! [`DocumentTool`] is the seam between orchestration and the subprocess: the
//! production implementation is [`Ghostscript`], tests substitute an
//! in-process fake. Every Ghostscript call is built from a fixed argument
//! template and passed to the OS as an argv list, never through a shell.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{ProcessError, Result};

/// Capabilities the service needs from the external document tool.
///
/// All methods run to completion before returning; implementations write
/// their output to the caller-supplied paths.
#[async_trait]
pub trait DocumentTool: Send + Sync {
    /// Rasterize only the first page of `input` to a JPEG at `output`.
    async fn render_first_page(&self, input: &Path, output: &Path) -> Result<()>;

    /// Number of pages in `input`.
    async fn page_count(&self, input: &Path) -> Result<u32>;

    /// Rasterize every page of `input`. `pattern` contains a single `%d`
    /// which the tool replaces with the 1-based page number.
    async fn render_pages(&self, input: &Path, pattern: &Path) -> Result<()>;

    /// Write a PDF containing only the pages of `input` matched by `pages`.
    async fn extract_pages(&self, input: &Path, output: &Path, pages: &str) -> Result<()>;

    /// Concatenate `inputs`, in order, into a single PDF at `output`.
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;
}

/// Rendering parameters for [`Ghostscript`].
#[derive(Debug, Clone)]
pub struct GhostscriptOptions {
    /// Path or name of the `gs` executable.
    pub binary: PathBuf,
    /// Raster resolution in dots per inch.
    pub resolution: u32,
    /// JPEG quality, 0-100.
    pub jpeg_quality: u8,
    /// Upper bound on a single invocation; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for GhostscriptOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("gs"),
            resolution: 300,
            jpeg_quality: 90,
            timeout: None,
        }
    }
}

/// [`DocumentTool`] backed by the Ghostscript command-line interpreter.
#[derive(Debug, Clone, Default)]
pub struct Ghostscript {
    options: GhostscriptOptions,
}

impl Ghostscript {
    pub fn new(options: GhostscriptOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GhostscriptOptions {
        &self.options
    }

    fn program(&self) -> String {
        self.options.binary.display().to_string()
    }

    fn first_page_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args = os_args([
            "-dSAFER".to_owned(),
            "-dBATCH".to_owned(),
            "-dNOPAUSE".to_owned(),
            "-sDEVICE=jpeg".to_owned(),
            format!("-r{}", self.options.resolution),
            format!("-dJPEGQ={}", self.options.jpeg_quality),
            "-dQUIET".to_owned(),
            "-dFirstPage=1".to_owned(),
            "-dLastPage=1".to_owned(),
            "-o".to_owned(),
        ]);
        args.push(output.as_os_str().to_owned());
        args.push(input.as_os_str().to_owned());
        args
    }

    fn page_count_args(&self, input: &Path) -> Vec<OsString> {
        os_args([
            "-q".to_owned(),
            "-dNOSAFER".to_owned(),
            "-dNODISPLAY".to_owned(),
            "-c".to_owned(),
            format!(
                "({}) (r) file runpdfbegin pdfpagecount = quit",
                postscript_string(&input.to_string_lossy())
            ),
        ])
    }

    fn all_pages_args(&self, input: &Path, pattern: &Path) -> Vec<OsString> {
        let mut args = os_args([
            "-dSAFER".to_owned(),
            "-dBATCH".to_owned(),
            "-dNOPAUSE".to_owned(),
            "-sDEVICE=jpeg".to_owned(),
            format!("-r{}", self.options.resolution),
            "-o".to_owned(),
        ]);
        args.push(pattern.as_os_str().to_owned());
        args.push(format!("-dJPEGQ={}", self.options.jpeg_quality).into());
        args.push("-q".into());
        args.push(input.as_os_str().to_owned());
        args.push("-c".into());
        args.push("quit".into());
        args
    }

    fn extract_args(&self, input: &Path, output: &Path, pages: &str) -> Vec<OsString> {
        let mut args = os_args(["-q", "-dBATCH", "-dNOPAUSE", "-o"]);
        args.push(output.as_os_str().to_owned());
        args.push(format!("-sPageList={pages}").into());
        args.push("-sDEVICE=pdfwrite".into());
        args.push(input.as_os_str().to_owned());
        args
    }

    fn merge_args(&self, inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut args = os_args(["-q", "-dNOPAUSE", "-o"]);
        args.push(output.as_os_str().to_owned());
        args.push("-sDEVICE=pdfwrite".into());
        args.push("-dBATCH".into());
        args.extend(inputs.iter().map(|p| p.as_os_str().to_owned()));
        args
    }

    /// Run `gs` with `args`, failing on spawn errors, timeout or a non-zero exit.
    async fn run(&self, operation: &str, args: Vec<OsString>) -> Result<Output> {
        let program = self.program();
        debug!(%program, operation, ?args, "invoking ghostscript");

        let mut command = Command::new(&self.options.binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| {
                    warn!(%program, operation, timeout = ?limit, "ghostscript timed out");
                    ProcessError::Timeout {
                        program: program.clone(),
                        timeout: limit,
                    }
                })?,
            None => command.output().await,
        }
        .map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

        if !output.status.success() {
            let diagnostic = diagnostic(&output);
            warn!(
                %program,
                operation,
                status = %output.status,
                diagnostic = %diagnostic,
                "ghostscript failed"
            );
            return Err(ProcessError::ToolFailed {
                program,
                status: output.status.to_string(),
                diagnostic,
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl DocumentTool for Ghostscript {
    async fn render_first_page(&self, input: &Path, output: &Path) -> Result<()> {
        self.run("render_first_page", self.first_page_args(input, output))
            .await
            .map(drop)
    }

    async fn page_count(&self, input: &Path) -> Result<u32> {
        let output = self.run("page_count", self.page_count_args(input)).await?;
        parse_page_count(&String::from_utf8_lossy(&output.stdout))
    }

    async fn render_pages(&self, input: &Path, pattern: &Path) -> Result<()> {
        self.run("render_pages", self.all_pages_args(input, pattern))
            .await
            .map(drop)
    }

    async fn extract_pages(&self, input: &Path, output: &Path, pages: &str) -> Result<()> {
        self.run("extract_pages", self.extract_args(input, output, pages))
            .await
            .map(drop)
    }

    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        if inputs.is_empty() {
            return Err(ProcessError::NoInputs);
        }
        self.run("merge", self.merge_args(inputs, output))
            .await
            .map(drop)
    }
}

fn os_args<S: Into<OsString>>(args: impl IntoIterator<Item = S>) -> Vec<OsString> {
    args.into_iter().map(Into::into).collect()
}

/// Escape `s` for use inside a PostScript `( … )` string literal.
fn postscript_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Ghostscript prints the count as the last line of stdout; anything before
/// it is interpreter chatter.
fn parse_page_count(stdout: &str) -> Result<u32> {
    let last = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or_default();
    last.parse()
        .map_err(|_| ProcessError::InvalidPageCount(stdout.trim().to_owned()))
}

/// Prefer stderr; `-q` sends some errors to stdout instead.
fn diagnostic(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_owned();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stdout = stdout.trim();
    if stdout.is_empty() {
        "no diagnostic output".to_owned()
    } else {
        stdout.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn first_page_template() {
        let gs = Ghostscript::default();
        let args = strings(gs.first_page_args(Path::new("/s/in"), Path::new("/s/out.jpg")));
        assert_eq!(
            args,
            [
                "-dSAFER", "-dBATCH", "-dNOPAUSE", "-sDEVICE=jpeg", "-r300", "-dJPEGQ=90",
                "-dQUIET", "-dFirstPage=1", "-dLastPage=1", "-o", "/s/out.jpg", "/s/in",
            ]
        );
    }

    #[test]
    fn all_pages_pattern_is_not_quoted() {
        let gs = Ghostscript::new(GhostscriptOptions {
            resolution: 150,
            jpeg_quality: 75,
            ..Default::default()
        });
        let args = strings(gs.all_pages_args(Path::new("/s/my doc"), Path::new("/s/x_page_%d.jpg")));
        assert_eq!(
            args,
            [
                "-dSAFER", "-dBATCH", "-dNOPAUSE", "-sDEVICE=jpeg", "-r150", "-o",
                "/s/x_page_%d.jpg", "-dJPEGQ=75", "-q", "/s/my doc", "-c", "quit",
            ]
        );
    }

    #[test]
    fn page_count_program_escapes_path() {
        let gs = Ghostscript::default();
        let args = strings(gs.page_count_args(Path::new("/s/a(b)\\c")));
        assert_eq!(&args[..4], ["-q", "-dNOSAFER", "-dNODISPLAY", "-c"]);
        assert_eq!(
            args[4],
            "(/s/a\\(b\\)\\\\c) (r) file runpdfbegin pdfpagecount = quit"
        );
    }

    #[test]
    fn extract_template_passes_page_list_through() {
        let gs = Ghostscript::default();
        let args = strings(gs.extract_args(Path::new("/s/in"), Path::new("/s/out.pdf"), "1,3-5"));
        assert_eq!(
            args,
            [
                "-q", "-dBATCH", "-dNOPAUSE", "-o", "/s/out.pdf", "-sPageList=1,3-5",
                "-sDEVICE=pdfwrite", "/s/in",
            ]
        );
    }

    #[test]
    fn merge_template_keeps_input_order() {
        let gs = Ghostscript::default();
        let inputs = vec![PathBuf::from("/s/b"), PathBuf::from("/s/a"), PathBuf::from("/s/c")];
        let args = strings(gs.merge_args(&inputs, Path::new("/s/out.pdf")));
        assert_eq!(
            args,
            [
                "-q", "-dNOPAUSE", "-o", "/s/out.pdf", "-sDEVICE=pdfwrite", "-dBATCH",
                "/s/b", "/s/a", "/s/c",
            ]
        );
    }

    #[test]
    fn parses_page_count() {
        assert_eq!(parse_page_count("12\n").unwrap(), 12);
        assert_eq!(parse_page_count("GPL Ghostscript 10.02\n  3  \n").unwrap(), 3);
        assert!(matches!(
            parse_page_count("Error: /undefinedfilename"),
            Err(ProcessError::InvalidPageCount(_))
        ));
        assert!(matches!(parse_page_count(""), Err(ProcessError::InvalidPageCount(_))));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let gs = Ghostscript::new(GhostscriptOptions {
            binary: PathBuf::from("/nonexistent/pagesmith-gs"),
            ..Default::default()
        });
        let err = gs.page_count(Path::new("/tmp/none.pdf")).await.unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }), "got {err:?}");
        assert!(err.is_tool_failure());
    }

    #[tokio::test]
    async fn merge_without_inputs_is_rejected_before_spawning() {
        let gs = Ghostscript::new(GhostscriptOptions {
            binary: PathBuf::from("/nonexistent/pagesmith-gs"),
            ..Default::default()
        });
        let err = gs.merge(&[], Path::new("/tmp/out.pdf")).await.unwrap_err();
        assert!(matches!(err, ProcessError::NoInputs));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_carries_diagnostic() {
        // A shell script stands in for gs so the test does not need it installed.
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-gs");
        std::fs::write(&script, "#!/bin/sh\necho 'Unrecoverable error: rangecheck' >&2\nexit 1\n")
            .unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let gs = Ghostscript::new(GhostscriptOptions {
            binary: script,
            ..Default::default()
        });
        let err = gs
            .extract_pages(Path::new("/tmp/in"), Path::new("/tmp/out.pdf"), "zzz")
            .await
            .unwrap_err();
        match err {
            ProcessError::ToolFailed { diagnostic, .. } => {
                assert_eq!(diagnostic, "Unrecoverable error: rangecheck");
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_kills_slow_tool() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-gs");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let gs = Ghostscript::new(GhostscriptOptions {
            binary: script,
            timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        });
        let err = gs.page_count(Path::new("/tmp/in")).await.unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { .. }), "got {err:?}");
    }
}
