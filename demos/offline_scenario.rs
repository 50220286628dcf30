/// Walks one complete voice lifecycle offline and prints the envelope as it
/// plays out: trigger, attack, decay, early release, silence.
use trivox::{SoftwareGraph, SynthEngine};

fn main() {
    println!("=== Voice Lifecycle Demo ===\n");

    let sample_rate = 48_000.0;
    let mut synth = SynthEngine::new(SoftwareGraph::new(sample_rate));
    synth.toggle_poly_mode(); // keep the chain alive through the release tail

    let params = *synth.params();
    println!("Parameters:");
    println!("  Waveform: {:?}", params.waveform);
    println!("  Cutoff:   {:.0}Hz (halved to {:.0}Hz at build time)",
        params.filter_cutoff_hz, params.filter_cutoff_hz / 2.0);
    println!("  Width:    {:.0} cents", params.width_cents);
    println!("  Volume:   {:.2}", params.volume);
    println!("  ADSR:     {:.0}ms / {:.0}ms / {:.0}% / {:.0}ms\n",
        params.adsr.attack * 1000.0,
        params.adsr.decay * 1000.0,
        params.adsr.sustain * 100.0,
        params.adsr.release * 1000.0);

    let note = synth.note_catalog()[0];
    println!("Triggering {} ({:.2}Hz)", note.label, note.frequency);
    synth.note_on(0).expect("catalog index 0 exists");

    let voice = synth.voices()[0].clone();
    let gain = voice.gain;

    // Release halfway up the attack ramp
    synth.graph_mut().advance(0.05);
    println!("Releasing mid-attack at t=0.05s\n");
    synth.note_off();

    println!("Gain envelope:");
    let stop_time = synth.voices()[0].release.expect("released").stop_time;
    let mut t = 0.0;
    while t <= stop_time + 0.05 {
        let value = synth.graph().gain_at(gain, t).unwrap_or(0.0);
        let bar = "#".repeat((value * 200.0) as usize);
        println!("  t={t:0.3}s  {value:0.4}  {bar}");
        t += 0.025;
    }

    // Play the tail out and let the reaper reclaim the chain
    let frames = (stop_time * sample_rate as f64) as usize;
    let mut buffer = vec![0.0f32; 512];
    let mut peak = 0.0f32;
    let mut rendered = 0;
    while rendered < frames {
        let chunk = (frames - rendered).min(buffer.len());
        synth.graph_mut().render(&mut buffer[..chunk]);
        peak = buffer[..chunk].iter().fold(peak, |p, s| p.max(s.abs()));
        rendered += chunk;
    }
    synth.reap();

    println!("\nRendered {rendered} samples, peak amplitude {peak:.3}");
    println!(
        "Voices after reap: {} (graph nodes: {})",
        synth.active_voices(),
        synth.graph().live_node_count()
    );
}
