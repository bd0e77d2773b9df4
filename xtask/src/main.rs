/// Packages the plugin into host-loadable bundles via nih_plug_xtask:
///
///   cargo xtask bundle mono-to-stereo --release
///
/// The `.clap` and `.vst3` bundles land in `target/bundled/`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
