//! Accumulation of hit pairs into angle-binned energy-energy matrices

use rayon::prelude::*;

use units::{Time, degree_, ns_};

use crate::angles::AngleTable;
use crate::config::Config;
use crate::distributions::{DistributionSet, Key};
use crate::event::Event;

/// Fills distribution sets from events. Holds only immutable state, so one
/// accumulator is shared by all processing slots.
pub struct Accumulator {
    config: Config,
    table: AngleTable,
}

impl Accumulator {

    pub fn new(config: Config, table: AngleTable) -> Self { Self { config, table } }

    pub fn table(&self) -> &AngleTable { &self.table }

    pub fn config(&self) -> &Config { &self.config }

    /// Empty distributions with one energy-energy matrix per angle bin
    pub fn new_slot(&self) -> DistributionSet {
        DistributionSet::new(&self.config, self.table.len())
    }

    /// Add all hits and ordered hit pairs of `event` to `slot`.
    pub fn process_event(&self, slot: &mut DistributionSet, event: &Event) {
        let degenerate_below = self.config.angles.degenerate_below;
        let prompt: Time = self.config.timing.prompt;

        for hit in &event.hits {
            slot.fill_spectrum(Key::Singles, hit.energy);
        }

        for (i, h1) in event.hits.iter().enumerate() {
            for (j, h2) in event.hits.iter().enumerate() {
                if i == j { continue }

                let angle = h1.position.angle(&h2.position);
                let dt = (h1.time - h2.time).abs();

                slot.fill_spectrum(Key::Timing, ns_(dt));
                slot.fill_matrix(Key::HitPattern, h1.array_number as f64, h2.array_number as f64);

                // Also rejects NaN
                let degenerate = !(degree_(angle) >= degenerate_below);
                if degenerate || dt >= prompt { continue }

                slot.fill_matrix(Key::GammaGamma, h1.energy, h2.energy);
                if let Some(bin) = self.table.lookup(angle) {
                    slot.fill_matrix(Key::AngleBin(bin), h1.energy, h2.energy);
                }
            }
        }
    }

    /// Single-threaded accumulation of `events` into a fresh set
    pub fn accumulate_serial<'e>(&self, events: impl IntoIterator<Item = &'e Event>) -> DistributionSet {
        let mut slot = self.new_slot();
        for event in events { self.process_event(&mut slot, event) }
        slot
    }

    /// Accumulate `events` in the current rayon thread pool, in chunks of
    /// `job_size` events per slot, and sum the slots.
    pub fn accumulate(&self, events: &[Event], job_size: usize) -> DistributionSet {
        let empty_slot = || self.new_slot();
        let add_slots = |mut a: DistributionSet, b: DistributionSet| { a += &b; a };
        let event_into_slot = |mut slot: DistributionSet, event: &Event| {
            self.process_event(&mut slot, event);
            slot
        };

        events.par_iter()
            .fold_chunks(job_size.max(1), empty_slot, event_into_slot)
            .reduce(empty_slot, add_slots)
    }

    /// Accumulate `events` into `n_slots` independent sets, without merging
    /// them.
    pub fn accumulate_in_slots(&self, events: &[Event], n_slots: usize) -> Vec<DistributionSet> {
        let chunk = job_size(events.len(), n_slots);
        events.par_chunks(chunk)
            .map(|chunk| self.accumulate_serial(chunk))
            .collect()
    }
}

/// Number of events per slot when spreading `n_events` over `n_threads`
pub fn job_size(n_events: usize, n_threads: usize) -> usize {
    (n_events / n_threads.max(1)).max(1)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Array;
    use crate::histogram::AxisSpec;
    use proptest::prelude::*;
    use pretty_assertions::assert_eq;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.energy = AxisSpec::new(100, 0.0, 100.0);
        config
    }

    fn accumulator() -> Accumulator {
        let config = small_config();
        let array = Array::new(config.geometry.distance);
        let table = AngleTable::from_positions(&array.positions(), &config.angles);
        Accumulator::new(config, table)
    }

    fn event(hits: &[(u32, f64, f64)]) -> Event {
        Event::from_crystals(&Array::default(), hits.iter().copied())
    }

    fn entries(set: &DistributionSet, key: Key) -> f64 {
        set.get(key).map_or(0.0, |d| d.entries())
    }

    fn angle_bin_entries(set: &DistributionSet) -> f64 {
        set.iter()
            .filter(|(k, _)| matches!(k, Key::AngleBin(_)))
            .map(|(_, d)| d.entries())
            .sum()
    }

    #[test]
    fn ordered_pairs_fill_timing_and_hit_pattern() {
        let acc = accumulator();
        for m in 0..6_u32 {
            let hits: Vec<_> = (0..m).map(|n| (4 * n + 1, 50.5, n as f64)).collect();
            let set = acc.accumulate_serial([&event(&hits)]);
            let pairs = (m * m.saturating_sub(1)) as f64;
            assert_eq!(entries(&set, Key::Singles)   , m as f64);
            assert_eq!(entries(&set, Key::Timing)    , pairs);
            assert_eq!(entries(&set, Key::HitPattern), pairs);
            assert_eq!(entries(&set, Key::GammaGamma), pairs);
            assert_eq!(angle_bin_entries(&set)       , pairs);
        }
    }

    #[test]
    fn hit_pattern_records_both_orderings() {
        let acc = accumulator();
        let set = acc.accumulate_serial([&event(&[(3, 20.5, 0.0), (40, 30.5, 5.0)])]);
        let hp = set.matrix(Key::HitPattern).unwrap();
        assert_eq!(hp.value( 3.0, 40.0), 1.0);
        assert_eq!(hp.value(40.0,  3.0), 1.0);
        let gg = set.matrix(Key::GammaGamma).unwrap();
        assert_eq!(gg.value(20.5, 30.5), 1.0);
        assert_eq!(gg.value(30.5, 20.5), 1.0);
    }

    #[test]
    fn pair_in_one_crystal_fills_only_timing_and_hit_pattern() {
        let acc = accumulator();
        let set = acc.accumulate_serial([&event(&[(7, 40.5, 0.0), (7, 60.5, 3.0)])]);
        assert_eq!(entries(&set, Key::Timing)    , 2.0);
        assert_eq!(entries(&set, Key::HitPattern), 2.0);
        assert_eq!(entries(&set, Key::GammaGamma), 0.0);
        assert_eq!(angle_bin_entries(&set)       , 0.0);
        assert_eq!(set.spectrum(Key::Timing).unwrap().value(3.0), 2.0);
    }

    #[test]
    fn only_prompt_pairs_fill_energy_matrices() {
        let acc = accumulator();
        let prompt = event(&[(1, 10.5, 0.0), (30, 20.5, 399.9)]);
        let random = event(&[(1, 10.5, 0.0), (30, 20.5, 400.0)]);
        let set = acc.accumulate_serial([&prompt, &random]);
        assert_eq!(entries(&set, Key::Timing)    , 4.0);
        assert_eq!(entries(&set, Key::HitPattern), 4.0);
        assert_eq!(entries(&set, Key::GammaGamma), 2.0);
        assert_eq!(angle_bin_entries(&set)       , 2.0);
    }

    #[test]
    fn pair_lands_in_bin_of_its_angle() {
        let acc = accumulator();
        let array = Array::default();
        let (a, b) = (5, 50);
        let angle = array.position(a).unwrap().angle(&array.position(b).unwrap());
        let bin = acc.table().lookup(angle).unwrap();
        let set = acc.accumulate_serial([&event(&[(a, 10.5, 0.0), (b, 20.5, 0.0)])]);
        assert_eq!(set.matrix(Key::AngleBin(bin)).unwrap().entries(), 2.0);
        assert_eq!(angle_bin_entries(&set), 2.0);
    }

    #[test]
    fn unmatched_angle_fills_only_summed_matrix() {
        let config = small_config();
        // Every pair angle in the array exceeds 1 degree
        let acc = Accumulator::new(config.clone(), AngleTable::from_angles([0.5, 1.0], config.angles.lookup_offset));
        let set = acc.accumulate_serial([&event(&[(1, 10.5, 0.0), (64, 20.5, 1.0)])]);
        assert_eq!(entries(&set, Key::GammaGamma), 2.0);
        assert_eq!(angle_bin_entries(&set)       , 0.0);
        assert_eq!(entries(&set, Key::Timing)    , 2.0);
    }

    fn events_strategy() -> impl Strategy<Value = Vec<Event>> {
        let hit = (1..=64_u32, 0.0..120.0_f64, 0.0..800.0_f64);
        proptest::collection::vec(proptest::collection::vec(hit, 0..5), 0..40)
            .prop_map(|events| events.iter().map(|hits| event(hits)).collect())
    }

    fn summary(set: &DistributionSet) -> Vec<(String, f64, Vec<(usize, usize, f64)>)> {
        set.keys().map(|key| {
            let bins = match (set.matrix(key), set.spectrum(key)) {
                (Some(m), _) => m.bins(),
                (_, Some(s)) => s.bins().into_iter().map(|(i, v)| (i, 0, v)).collect(),
                _            => vec![],
            };
            (key.name(), entries(set, key), bins)
        }).collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn results_do_not_depend_on_slots(events in events_strategy(), job_size in 1..10_usize) {
            let acc = accumulator();
            let serial   = acc.accumulate_serial(&events);
            let parallel = acc.accumulate(&events, job_size);
            let again    = acc.accumulate(&events, job_size);
            prop_assert_eq!(summary(&serial), summary(&parallel));
            prop_assert_eq!(summary(&parallel), summary(&again));
        }

        #[test]
        fn merge_order_is_irrelevant(events in events_strategy(), n_slots in 1..5_usize) {
            let acc = accumulator();
            let slots = acc.accumulate_in_slots(&events, n_slots);
            let forward  = DistributionSet::merge_all(slots.iter().cloned()).unwrap();
            let backward = DistributionSet::merge_all(slots.into_iter().rev()).unwrap();
            let expected = acc.accumulate_serial(&events);
            match (forward, backward) {
                (Some(f), Some(b)) => {
                    prop_assert_eq!(summary(&f), summary(&b));
                    prop_assert_eq!(summary(&f), summary(&expected));
                }
                (None, None) => prop_assert!(events.is_empty()),
                _ => prop_assert!(false, "inconsistent merge results"),
            }
        }
    }
}
