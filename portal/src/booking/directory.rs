use shared::types::portal_config::DoctorEntry;

/// Department and doctor lookup for the first two booking steps.
#[derive(Debug, Clone, Default)]
pub struct DoctorDirectory {
    doctors: Vec<DoctorEntry>,
}

impl DoctorDirectory {
    pub fn new(doctors: Vec<DoctorEntry>) -> Self {
        Self { doctors }
    }

    /// Department names in first-seen order, without duplicates.
    pub fn departments(&self) -> Vec<&str> {
        let mut departments: Vec<&str> = Vec::new();
        for doctor in &self.doctors {
            if !departments.contains(&doctor.department.as_str()) {
                departments.push(&doctor.department);
            }
        }
        departments
    }

    pub fn has_department(&self, department: &str) -> bool {
        self.doctors.iter().any(|d| d.department == department)
    }

    pub fn doctors_in<'a>(&'a self, department: &'a str) -> impl Iterator<Item = &'a DoctorEntry> {
        self.doctors.iter().filter(move |d| d.department == department)
    }

    pub fn doctor(&self, id: i64) -> Option<&DoctorEntry> {
        self.doctors.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.doctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::portal_config::default_doctors;

    #[test]
    fn default_catalogue_groups_by_department() {
        let directory = DoctorDirectory::new(default_doctors());
        let departments = directory.departments();
        assert_eq!(departments.len(), 10);
        assert_eq!(departments[0], "Cardiology");

        let cardiology: Vec<i64> = directory.doctors_in("Cardiology").map(|d| d.id).collect();
        assert_eq!(cardiology, vec![1, 7]);
        assert_eq!(directory.doctors_in("Radiology").count(), 0);
    }

    #[test]
    fn lookup_by_id() {
        let directory = DoctorDirectory::new(default_doctors());
        assert_eq!(directory.doctor(4).unwrap().department, "Pediatrics");
        assert!(directory.doctor(99).is_none());
    }
}
