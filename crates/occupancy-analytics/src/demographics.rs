//! 在院患者性别分布

use occupancy_core::{Gender, Patient};
use serde::{Deserialize, Serialize};

use crate::lookup::{FacilityLookup, HospitalFilter};

/// 性别分布；无法识别的性别单独计入 `unknown`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderDistribution {
    pub male: usize,
    pub female: usize,
    pub unknown: usize,
}

impl GenderDistribution {
    pub fn total(&self) -> usize {
        self.male + self.female + self.unknown
    }
}

/// 统计在院患者的性别分布，可按机构名称过滤
pub fn gender_distribution(
    patients: &[Patient],
    lookup: &FacilityLookup,
    filter: &HospitalFilter,
) -> GenderDistribution {
    patients
        .iter()
        .filter(|p| p.is_ongoing() && filter.matches(lookup, p))
        .fold(GenderDistribution::default(), |mut acc, p| {
            match p.gender {
                Gender::Male => acc.male += 1,
                Gender::Female => acc.female += 1,
                Gender::Unknown => acc.unknown += 1,
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{facility, patient};

    #[test]
    fn test_counts_only_ongoing_patients() {
        let lookup = FacilityLookup::new(&[
            facility(1, "Hospital A", 10, 50000),
            facility(2, "Hospital B", 10, 50100),
        ]);
        let mut male = patient(1, 1, "2024-01-01", None, 3);
        male.gender = Gender::Male;
        let female = patient(2, 2, "2024-01-01", None, 3);
        let discharged = patient(3, 1, "2024-01-01", Some("2024-01-02"), 3);
        let mut unknown = patient(4, 1, "2024-01-01", None, 3);
        unknown.gender = Gender::Unknown;
        let patients = vec![male, female, discharged, unknown];

        let all = gender_distribution(&patients, &lookup, &HospitalFilter::all());
        assert_eq!(all, GenderDistribution { male: 1, female: 1, unknown: 1 });

        let a = gender_distribution(&patients, &lookup, &HospitalFilter::named("Hospital A"));
        assert_eq!(a, GenderDistribution { male: 1, female: 0, unknown: 1 });
    }

    #[test]
    fn test_male_plus_female_bounded_by_ongoing() {
        let lookup = FacilityLookup::new(&[facility(1, "Hospital A", 10, 50000)]);
        let patients: Vec<Patient> = (0..10)
            .map(|i| {
                let mut p = patient(i, 1, "2024-01-01", (i % 3 == 0).then_some("2024-01-05"), 2);
                p.gender = match i % 4 {
                    0 => Gender::Male,
                    1 => Gender::Female,
                    _ => Gender::Unknown,
                };
                p
            })
            .collect();

        let filter = HospitalFilter::all();
        let dist = gender_distribution(&patients, &lookup, &filter);
        let ongoing = patients.iter().filter(|p| p.is_ongoing()).count();
        assert!(dist.male + dist.female <= ongoing);
        assert_eq!(dist.total(), ongoing);
    }
}
