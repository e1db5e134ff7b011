use super::ElementSet;

/// Ready-made element sets for quick starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    Cat,
    Logo,
    Landscape,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Cat, Preset::Logo, Preset::Landscape];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Cat => "cat",
            Preset::Logo => "logo",
            Preset::Landscape => "landscape",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(value.trim()))
    }

    pub fn elements(self) -> ElementSet {
        match self {
            Preset::Cat => ElementSet {
                subject: "white persian cat".into(),
                composition: "close-up portrait".into(),
                style: "professional photography".into(),
                lighting: "soft morning light".into(),
                color: "warm tones".into(),
                mood: "calm".into(),
                details: "blue eyes, soft fur".into(),
                context: "professional photo shoot".into(),
            },
            Preset::Logo => ElementSet {
                subject: "minimalist logo".into(),
                composition: "symmetrical".into(),
                style: "minimalist".into(),
                lighting: "clean lighting".into(),
                color: "blue and trustworthy colors".into(),
                mood: "professional".into(),
                details: "simple and memorable".into(),
                context: "business branding".into(),
            },
            Preset::Landscape => ElementSet {
                subject: "mountain landscape with a lake".into(),
                composition: "wide angle".into(),
                style: "realistic".into(),
                lighting: "dramatic sunset".into(),
                color: "gold and orange hues".into(),
                mood: "calm".into(),
                details: "reflections on the water".into(),
                context: "nature photography".into(),
            },
        }
    }
}
