//! crates/agrivision_core/src/treatments.rs
//!
//! Hand-written treatment notes bundled with the application, keyed by the
//! classifier's label.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DangerLevel {
    None,
    Low,
    Medium,
    High,
}

/// Treatment notes for one disease in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreatmentInfo {
    pub name: String,
    pub treatment: String,
    pub danger: DangerLevel,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreatmentLang {
    En,
    Mr,
    Hi,
}

impl TreatmentLang {
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "en-in" | "english" => Some(Self::En),
            "mr" | "mr-in" | "marathi" => Some(Self::Mr),
            "hi" | "hi-in" | "hindi" => Some(Self::Hi),
            _ => None,
        }
    }
}

struct Entry {
    name: &'static str,
    treatment: &'static str,
    danger: DangerLevel,
    actions: &'static [&'static str],
}

impl Entry {
    fn to_info(&self) -> TreatmentInfo {
        TreatmentInfo {
            name: self.name.to_string(),
            treatment: self.treatment.to_string(),
            danger: self.danger,
            actions: self.actions.iter().map(|a| a.to_string()).collect(),
        }
    }
}

struct DiseaseRecord {
    label: &'static str,
    en: Entry,
    mr: Entry,
    hi: Option<Entry>,
}

const TREATMENTS: &[DiseaseRecord] = &[
    DiseaseRecord {
        label: "Soybean___healthy",
        en: Entry {
            name: "Healthy Soybean",
            treatment: "Maintain current irrigation.",
            danger: DangerLevel::None,
            actions: &["Continue monitoring", "Soil check in 7 days"],
        },
        mr: Entry {
            name: "निरोगी सोयाबीन",
            treatment: "सिंचन चालू ठेवा.",
            danger: DangerLevel::None,
            actions: &["नियमित तपासणी", "७ दिवसात माती परीक्षण"],
        },
        hi: None,
    },
    DiseaseRecord {
        label: "Soybean___rust",
        en: Entry {
            name: "Soybean Rust",
            treatment: "Spray a triazole fungicide at first sign of pustules.",
            danger: DangerLevel::High,
            actions: &[
                "Spray hexaconazole or propiconazole",
                "Remove heavily infected leaves",
                "Avoid overhead irrigation",
            ],
        },
        mr: Entry {
            name: "सोयाबीन तांबेरा",
            treatment: "पहिली लक्षणे दिसताच ट्रायझोल बुरशीनाशकाची फवारणी करा.",
            danger: DangerLevel::High,
            actions: &[
                "हेक्साकोनाझोल किंवा प्रोपिकोनाझोल फवारा",
                "जास्त बाधित पाने काढून टाका",
                "वरून पाणी देणे टाळा",
            ],
        },
        hi: Some(Entry {
            name: "सोयाबीन रस्ट",
            treatment: "पहले लक्षण दिखते ही ट्रायज़ोल फफूंदनाशक का छिड़काव करें।",
            danger: DangerLevel::High,
            actions: &[
                "हेक्साकोनाज़ोल या प्रोपिकोनाज़ोल छिड़कें",
                "अधिक संक्रमित पत्तियाँ हटाएँ",
                "ऊपर से सिंचाई न करें",
            ],
        }),
    },
    DiseaseRecord {
        label: "Grape___healthy",
        en: Entry {
            name: "Healthy Grape",
            treatment: "No treatment needed.",
            danger: DangerLevel::None,
            actions: &["Continue weekly scouting", "Keep canopy open"],
        },
        mr: Entry {
            name: "निरोगी द्राक्ष",
            treatment: "उपचाराची गरज नाही.",
            danger: DangerLevel::None,
            actions: &["आठवड्याला पाहणी सुरू ठेवा", "वेलीची छाटणी मोकळी ठेवा"],
        },
        hi: None,
    },
    DiseaseRecord {
        label: "Grape___Downy_mildew",
        en: Entry {
            name: "Grape Downy Mildew",
            treatment: "Apply a copper or metalaxyl-mancozeb spray and reduce leaf wetness.",
            danger: DangerLevel::High,
            actions: &[
                "Spray metalaxyl + mancozeb",
                "Improve canopy airflow",
                "Destroy fallen infected leaves",
            ],
        },
        mr: Entry {
            name: "द्राक्ष केवडा",
            treatment: "कॉपर किंवा मेटॅलॅक्सिल-मॅन्कोझेब फवारणी करा आणि पानांवरील ओलावा कमी करा.",
            danger: DangerLevel::High,
            actions: &[
                "मेटॅलॅक्सिल + मॅन्कोझेब फवारा",
                "वेलीत हवा खेळती ठेवा",
                "गळलेली बाधित पाने नष्ट करा",
            ],
        },
        hi: None,
    },
    DiseaseRecord {
        label: "Grape___Black_rot",
        en: Entry {
            name: "Grape Black Rot",
            treatment: "Remove mummified berries and spray a protectant fungicide.",
            danger: DangerLevel::Medium,
            actions: &[
                "Remove mummified clusters",
                "Spray mancozeb before bloom",
                "Prune for sunlight penetration",
            ],
        },
        mr: Entry {
            name: "द्राक्ष काळी कूज",
            treatment: "सुकलेले मणी काढा आणि संरक्षक बुरशीनाशक फवारा.",
            danger: DangerLevel::Medium,
            actions: &[
                "सुकलेले घड काढून टाका",
                "फुलोऱ्यापूर्वी मॅन्कोझेब फवारा",
                "सूर्यप्रकाशासाठी छाटणी करा",
            ],
        },
        hi: None,
    },
];

const GENERIC_TREATMENT: &str =
    "Neural analysis complete. Consult the AI expert for treatment steps.";
const GENERIC_ACTIONS: &[&str] = &[
    "Isolate the specimen",
    "Check surrounding vegetation",
    "Consult local expert",
];

/// Turns `Grape___Black_rot` into `Grape Black rot`.
pub fn display_name(label: &str) -> String {
    label.replace("___", " ").replace('_', " ")
}

/// Looks a label up in the requested language, falling back to English.
pub fn lookup(label: &str, lang: TreatmentLang) -> Option<TreatmentInfo> {
    let record = TREATMENTS.iter().find(|r| r.label == label)?;
    let entry = match lang {
        TreatmentLang::En => &record.en,
        TreatmentLang::Mr => &record.mr,
        TreatmentLang::Hi => record.hi.as_ref().unwrap_or(&record.en),
    };
    Some(entry.to_info())
}

/// Like [`lookup`], but labels without notes get a generic record.
pub fn lookup_or_generic(label: &str, lang: TreatmentLang) -> TreatmentInfo {
    lookup(label, lang).unwrap_or_else(|| TreatmentInfo {
        name: display_name(label),
        treatment: GENERIC_TREATMENT.to_string(),
        danger: DangerLevel::Medium,
        actions: GENERIC_ACTIONS.iter().map(|a| a.to_string()).collect(),
    })
}
