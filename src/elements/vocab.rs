use std::fmt;

use clap::{ValueEnum, builder::PossibleValue};

// Closed choice sets offered by the front ends. The assembler never sees these
// types; it only receives their display strings.
macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ValueEnum for $name {
            fn value_variants<'a>() -> &'a [Self] {
                Self::ALL
            }

            fn to_possible_value(&self) -> Option<PossibleValue> {
                Some(PossibleValue::new(self.as_str()))
            }
        }
    };
}

vocabulary! {
    /// Rendering style.
    Style {
        Realistic => "realistic",
        Cartoon => "cartoon",
        Watercolor => "watercolor",
        OilPainting => "oil painting",
        Sketch => "sketch",
        Render3d => "3D render",
        Minimalist => "minimalist",
        Vintage => "vintage",
        Modern => "modern",
        Photography => "professional photography",
    }
}

vocabulary! {
    Lighting {
        SoftMorning => "soft morning light",
        DramaticSunset => "dramatic sunset",
        Studio => "studio lighting",
        NaturalDaylight => "natural daylight",
        MoodyShadows => "moody shadows",
        BrightAiry => "bright and airy",
    }
}

vocabulary! {
    Mood {
        Energetic => "energetic",
        Calm => "calm",
        Mysterious => "mysterious",
        Professional => "professional",
        Playful => "playful",
        Elegant => "elegant",
        Rustic => "rustic",
        Futuristic => "futuristic",
    }
}

vocabulary! {
    /// Camera framing.
    Composition {
        CloseUp => "close-up portrait",
        WideAngle => "wide angle",
        BirdsEye => "bird's eye view",
        LowAngle => "low angle",
        Symmetrical => "symmetrical",
        RuleOfThirds => "rule of thirds",
    }
}
