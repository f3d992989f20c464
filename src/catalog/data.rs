//! Built-in barangay table for Manolo Fortich, Bukidnon.
//!
//! Centers are approximate barangay-proper locations; radii roughly follow
//! the settled area of each barangay.

/// Municipality every built-in subdivision belongs to.
pub const MUNICIPALITY: &str = "Manolo Fortich";

/// (name, latitude, longitude, containment radius km)
pub const BARANGAYS: &[(&str, f64, f64, f64)] = &[
    ("Agusan Canyon", 8.3475, 124.8197, 2.0),
    ("Alae", 8.4290, 124.8140, 2.5),
    ("Dahilayan", 8.2211, 124.8497, 3.5),
    ("Dalirig", 8.3780, 124.9040, 2.5),
    ("Damilag", 8.3547, 124.8122, 2.0),
    ("Diclum", 8.3580, 124.8520, 1.2),
    ("Guilang-guilang", 8.3900, 124.8770, 1.5),
    ("Kalugmanan", 8.2810, 124.8640, 3.0),
    ("Lindaban", 8.2950, 124.8900, 2.5),
    ("Lingion", 8.4190, 124.8690, 2.0),
    ("Lunocan", 8.3820, 124.8480, 1.5),
    ("Maluko", 8.3680, 124.9470, 3.0),
    ("Mambatangan", 8.4070, 124.8100, 2.0),
    ("Mampayag", 8.3290, 124.8770, 2.0),
    ("Mantibugao", 8.4010, 124.8340, 1.8),
    ("Minsuro", 8.3160, 124.8410, 2.5),
    ("San Miguel", 8.3830, 124.8300, 1.5),
    ("Sankanan", 8.3130, 124.9220, 3.0),
    ("Santiago", 8.4330, 124.8930, 2.5),
    ("Santo Niño", 8.4470, 124.8500, 2.5),
    ("Tankulan (Pob.)", 8.3686, 124.8634, 1.0),
    ("Ticala", 8.3500, 124.8900, 2.0),
];
