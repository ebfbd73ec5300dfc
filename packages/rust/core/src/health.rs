//! Health aggregation policy.

use chrono::{DateTime, Utc};

use nightbrief_shared::{ChannelHealth, HealthState};

/// Combine component health into the system verdict.
///
/// The system is healthy when every backend is healthy and at least one
/// notification channel can deliver. The asymmetry is deliberate: both
/// backends are required for a run to produce a report, but a single
/// working channel is enough to get it to someone.
pub fn aggregate_health(
    search_reader: bool,
    summarizer: bool,
    channels: Vec<ChannelHealth>,
    checked_at: DateTime<Utc>,
) -> HealthState {
    let any_channel = channels.iter().any(|c| c.healthy);
    HealthState {
        healthy: search_reader && summarizer && any_channel,
        search_reader,
        summarizer,
        channels,
        checked_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(health: &[bool]) -> Vec<ChannelHealth> {
        health
            .iter()
            .enumerate()
            .map(|(i, &healthy)| ChannelHealth {
                name: format!("channel-{i}"),
                healthy,
            })
            .collect()
    }

    #[test]
    fn healthy_requires_all_backends_and_any_channel() {
        let cases = [
            // (search_reader, summarizer, channels, expected)
            (true, true, vec![true, true], true),
            (true, true, vec![true, false], true),
            (true, true, vec![false, false], false),
            (true, true, vec![], false),
            (false, true, vec![true, true], false),
            (true, false, vec![true, true], false),
            (false, false, vec![false], false),
        ];

        for (search_reader, summarizer, chans, expected) in cases {
            let state = aggregate_health(
                search_reader,
                summarizer,
                channels(&chans),
                Utc::now(),
            );
            assert_eq!(
                state.healthy, expected,
                "search_reader={search_reader} summarizer={summarizer} channels={chans:?}"
            );
        }
    }

    #[test]
    fn component_states_are_passed_through() {
        let state = aggregate_health(true, false, channels(&[true]), Utc::now());
        assert!(state.search_reader);
        assert!(!state.summarizer);
        assert_eq!(state.channels.len(), 1);
    }
}
