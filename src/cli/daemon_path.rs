use std::path::PathBuf;

/// Path of the daemon executable, which is expected to lie next to the cli.
pub fn to_daemon_path(mut path: PathBuf) -> PathBuf {
    path.set_file_name("timetally-daemon");
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}
