//! Built-in traffic camera installations.
//!
//! Positions and descriptions as published for the Data.gov.sg traffic
//! images feed. Descriptions keep the source spelling.

/// Date the installations below were surveyed.
pub const SNAPSHOT_DATE: &str = "2022-12-13";

/// `(id, latitude, longitude, description)` in ascending ID order.
#[allow(clippy::unreadable_literal, clippy::excessive_precision)]
pub(crate) const CAMERA_LOCATIONS: &[(u32, f64, f64, &str)] = &[
    (1001, 1.29531332, 103.871146, "ECP/MCE/KPE instersection"),
    (1002, 1.319541067, 103.8785627, "PIE/KPE intersection near Kallang Bahru"),
    (1003, 1.323957439, 103.8728576, "PIE near Bendemeer Road exit"),
    (1004, 1.319535712, 103.8750668, "PIE/KPE slip road at Kallang Bahru"),
    (1005, 1.363519886, 103.905394, "KPE/TPE intersection"),
    (1006, 1.357098686, 103.902042, "KPE near Defu Flyover"),
    (1111, 1.365434, 103.953997, "TPE near Tampines Avenue 10 exit"),
    (1112, 1.3605, 103.961412, "TPE/PIE intersection at Tampines"),
    (1113, 1.317036, 103.988598, "ECP near Changi Coast Road"),
    (1501, 1.27414394350065, 103.851316802547, "Marina Boulevard/Marina Coastal Expressway"),
    (1502, 1.27135090682664, 103.861828440597, "MCE near Marina Bay Sands tunnel exit"),
    (1503, 1.27066408655104, 103.856977943394, "MCE towards AYE"),
    (1504, 1.29409891409364, 103.876056196568, "ECP/MCE interchange near Gardens by the Bay"),
    (1505, 1.2752977149006, 103.866390381759, "Marina Coastal Drive/MCE"),
    (1701, 1.323604823, 103.8587802, "CTE near Moulmein Flyover"),
    (1702, 1.34355015, 103.8601984, "CTE near Braddell Flyover"),
    (1703, 1.32814722194857, 103.862203282048, "CTE near St George's Road"),
    (1704, 1.28569398886979, 103.837524510188, "CTE near Chin Swee Road"),
    (1705, 1.375925022, 103.8587986, "CTE near Ang Mo Kio Avenue 5 Flyover"),
    (1706, 1.38861, 103.85806, "CTE near Yio Chu Kang Flyover"),
    (1707, 1.280365843, 103.8304511, "CTE near Bukit Merah Flyover"),
    (1709, 1.313842, 103.845603, "CTE near Cavenagh Road exit"),
    (1711, 1.35296, 103.85719, "CTE near Ang Mo Kio Avenue 1 Flyover"),
    (2701, 1.447023728, 103.7716543, "Causeway"),
    (2702, 1.445554109, 103.7683397, "Woodlands Checkpoint"),
    (2703, 1.35047790791386, 103.791033581325, "BKE near Chantek Flyover"),
    (2704, 1.429588536, 103.769311, "BKE near Woodlands Flyover"),
    (2705, 1.36728572, 103.7794698, "BKE near Dairy Farm Flyover"),
    (2706, 1.414142, 103.771168, "BKE entrance after Mandai Road"),
    (2707, 1.3983, 103.774247, "BKE exit to Mandai Road"),
    (2708, 1.3865, 103.7747, "BKE near Gali Batu Flyover"),
    (3702, 1.33831, 103.98032, "ECP entrance from PIE at Changi"),
    (3704, 1.295855016, 103.8803147, "ECP near Fort Road"),
    (3705, 1.32743, 103.97383, "ECP near Tanah Merah Coast Road"),
    (3793, 1.309330837, 103.9350504, "ECP near Laguna Flyover"),
    (3795, 1.301451452, 103.9105963, "ECP near Marine Parade Flyover"),
    (3796, 1.297512569, 103.8983019, "ECP near Tanjong Katong Flyover"),
    (3797, 1.295657333, 103.885283, "ECP near Tanjong Rhu"),
    (3798, 1.29158484, 103.8615987, "ECP near Benjamin Sheares Bridge"),
    (4701, 1.2871, 103.79633, "AYE after Portsdown Flyover"),
    (4702, 1.27237, 103.8324, "AYE near Keppel Viaduct"),
    (4703, 1.348697862, 103.6350383, "Tuas Second Link"),
    (4704, 1.27877, 103.82375, "AYE near Lower Delta Road Flyover"),
    (4705, 1.32618, 103.73028, "AYE near Yuan Ching Road exit"),
    (4706, 1.29792, 103.78205, "AYE near NUS sliproad"),
    (4707, 1.333446481, 103.6527008, "AYE towards Tuas Checkpoint"),
    (4708, 1.29939, 103.7799, "AYE near ITE College West Dover"),
    (4709, 1.312019, 103.763002, "AYE near Clementi Avenue 6 entrance"),
    (4710, 1.32153, 103.75273, "AYE near Pandan Garden"),
    (4712, 1.341244001, 103.6439134, "AYE near Tuas Avenue 8 exit"),
    (4713, 1.347645829, 103.6366955, "Tuas Checkpoint"),
    (4714, 1.31023, 103.76438, "AYE near West Coast Walk"),
    (4716, 1.32227, 103.67453, "AYE entrance from Benoi Road"),
    (4798, 1.259999997, 103.8236111, "Sentosa Gateway towards Telok Blangah"),
    (4799, 1.260277774, 103.8238889, "Sentosa Gateway towards Sentosa"),
    (5794, 1.3309693, 103.9168616, "PIE near Bedok North Avenue 3"),
    (5795, 1.326024822, 103.905625, "PIE near Eunos Flyover"),
    (5797, 1.322875288, 103.8910793, "PIE near Paya Lebar Flyover"),
    (5798, 1.320360781, 103.8771741, "PIE near Aljunied West Flyover"),
    (5799, 1.328171608, 103.8685191, "PIE near Woodsville Flyover"),
    (6701, 1.329334, 103.858222, "PIE near Kim Keat Link"),
    (6703, 1.328899, 103.84121, "PIE near Thomson Flyover"),
    (6704, 1.326574036, 103.8268573, "PIE near Mount Pleasant Flyover"),
    (6705, 1.332124, 103.81768, "PIE near Adam Flyover"),
    (6706, 1.349428893, 103.7952799, "PIE near BKE"),
    (6708, 1.345996, 103.69016, "PIE near Nanyang Flyover"),
    (6710, 1.344205, 103.78577, "PIE near Jalan Anak Bukit"),
    (6711, 1.33771, 103.977827, "PIE near ECP at Changi"),
    (6712, 1.332691, 103.770278, "PIE near Clementi Avenue 6 exit"),
    (6713, 1.340298, 103.945652, "PIE near Simei Avenue"),
    (6714, 1.361742, 103.703341, "PIE near Jurong West Street 81"),
    (6715, 1.356299, 103.716071, "PIE near Hong Kah Flyover"),
    (6716, 1.322935, 103.6635, "AYE near Tuas Flyover"),
    (7791, 1.354245, 103.963782, "TPE near Upper Changi Flyover"),
    (7793, 1.37704704, 103.9294698, "TPE near Tampines Avenue 10 entrance"),
    (7794, 1.37988658, 103.9200917, "TPE near Pasir Ris Drive 12"),
    (7795, 1.38432741, 103.915857, "TPE near Punggol Road"),
    (7796, 1.39559294, 103.9051571, "TPE near Sengkang West Avenue"),
    (7797, 1.40002575, 103.8570253, "TPE near Seletar Flyover"),
    (7798, 1.40189519, 103.8489342, "TPE/SLE intersection"),
    (8701, 1.38647, 103.74143, "KJE near Choa Chu Kang West Flyover"),
    (8702, 1.39059, 103.7717, "KJE near Woodlands Road exit"),
    (8704, 1.3899, 103.74843, "KJE near Choa Chu Kang Drive entrance"),
    (8706, 1.3664, 103.70899, "KJE near Tengah Flyover"),
    (9701, 1.39466333, 103.834746, "SLE near Lentor Flyover"),
    (9702, 1.39474081, 103.8179709, "SLE near Upper Thomson Flyover"),
    (9703, 1.422857, 103.773005, "SLE near Woodlands South Flyover"),
    (9704, 1.42214311, 103.7954206, "SLE near Ulu Sembawang Flyover"),
    (9705, 1.42627712, 103.7871664, "SLE near Marsiling Flyover"),
    (9706, 1.41270056, 103.8064271, "SLE near Mandai Lake Flyover"),
];
