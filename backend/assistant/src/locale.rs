//! User-facing text. Spanish is the product default.

use std::str::FromStr;

use umlscan_core::ScanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "es" | "es-es" | "es-mx" | "spanish" => Ok(Self::Es),
            "en" | "en-us" | "en-gb" | "english" => Ok(Self::En),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

fn pick(locale: Locale, es: &str, en: &str) -> String {
    match locale {
        Locale::Es => es.to_string(),
        Locale::En => en.to_string(),
    }
}

fn picks(locale: Locale, es: &[&str], en: &[&str]) -> Vec<String> {
    let chosen = match locale {
        Locale::Es => es,
        Locale::En => en,
    };
    chosen.iter().map(|s| s.to_string()).collect()
}

/// Human-readable byte size: whole MB, one decimal, or KB below 1 MB.
fn size_label(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{} KB", bytes / KB)
    } else {
        format!("{bytes} B")
    }
}

impl Locale {
    // --- scan results ---

    pub fn scan_success(self, classes: usize, relations: usize, confidence: f32) -> String {
        let pct = (confidence * 100.0).round() as u32;
        match self {
            Locale::Es => format!(
                "✅ Diagrama escaneado: {classes} clases y {relations} relaciones detectadas (confianza {pct}%)"
            ),
            Locale::En => format!(
                "✅ Diagram scanned: {classes} classes and {relations} relations detected ({pct}% confidence)"
            ),
        }
    }

    pub fn scan_partial(self, classes: usize, relations: usize, confidence: f32) -> String {
        let pct = (confidence * 100.0).round() as u32;
        match self {
            Locale::Es => format!(
                "⚠️ Diagrama escaneado parcialmente: {classes} clases y {relations} relaciones (confianza {pct}%). Revisa las sugerencias antes de aplicarlas"
            ),
            Locale::En => format!(
                "⚠️ Diagram partially scanned: {classes} classes and {relations} relations ({pct}% confidence). Review the suggestions before applying them"
            ),
        }
    }

    pub fn scan_failed(self, candidate_classes: usize) -> String {
        match (self, candidate_classes) {
            (Locale::Es, 0) => "❌ No se detectaron clases UML en la imagen".to_string(),
            (Locale::En, 0) => "❌ No UML classes were detected in the image".to_string(),
            (Locale::Es, n) => format!(
                "❌ No se pudo reconocer el diagrama con suficiente confianza (se encontraron {n} posibles clases)"
            ),
            (Locale::En, n) => format!(
                "❌ The diagram could not be recognized with enough confidence ({n} possible classes found)"
            ),
        }
    }

    pub fn scan_already_present(self) -> String {
        pick(
            self,
            "ℹ️ Todas las clases y relaciones detectadas ya están en tu diagrama",
            "ℹ️ Every detected class and relation is already in your diagram",
        )
    }

    pub fn caution_tips(self) -> Vec<String> {
        picks(
            self,
            &[
                "🔍 Revisa los nombres de clases y atributos antes de aplicarlos",
                "🔗 Verifica la dirección y el tipo de cada relación",
                "📷 Una imagen con mejor contraste mejora la detección",
            ],
            &[
                "🔍 Check class and attribute names before applying them",
                "🔗 Verify the direction and kind of each relation",
                "📷 A higher-contrast image improves detection",
            ],
        )
    }

    pub fn image_tips(self) -> Vec<String> {
        picks(
            self,
            &[
                "📷 Asegúrate de que la imagen sea clara y legible",
                "🔍 Verifica que contenga un diagrama UML con clases visibles",
                "💡 Usa imágenes con buena resolución y contraste",
            ],
            &[
                "📷 Make sure the image is clear and legible",
                "🔍 Check that it contains a UML diagram with visible classes",
                "💡 Use images with good resolution and contrast",
            ],
        )
    }

    pub fn image_next_steps(self) -> Vec<String> {
        picks(
            self,
            &[
                "Intenta con una imagen más clara",
                "Asegúrate de que el texto sea legible",
                "Verifica que sea un diagrama UML de clases",
            ],
            &[
                "Try again with a clearer image",
                "Make sure the text is legible",
                "Check that it is a UML class diagram",
            ],
        )
    }

    // --- input and backend failures ---

    pub fn input_rejected(self, err: &ScanError) -> String {
        match (self, err) {
            (Locale::Es, ScanError::UnsupportedMediaType(_)) => {
                "❌ Solo se permiten archivos de imagen (PNG, JPG, GIF, BMP o WEBP)".to_string()
            }
            (Locale::En, ScanError::UnsupportedMediaType(_)) => {
                "❌ Only image files are allowed (PNG, JPG, GIF, BMP or WEBP)".to_string()
            }
            (Locale::Es, ScanError::ImageTooLarge { max, .. }) => format!(
                "❌ La imagen supera el tamaño máximo permitido de {}",
                size_label(*max)
            ),
            (Locale::En, ScanError::ImageTooLarge { max, .. }) => format!(
                "❌ The image exceeds the maximum allowed size of {}",
                size_label(*max)
            ),
            (Locale::Es, ScanError::InvalidUpload(_)) => {
                "❌ No se pudo leer el archivo enviado".to_string()
            }
            (Locale::En, ScanError::InvalidUpload(_)) => {
                "❌ The uploaded file could not be read".to_string()
            }
            (Locale::Es, _) => "❌ No se proporcionó ningún archivo de imagen".to_string(),
            (Locale::En, _) => "❌ No image file was provided".to_string(),
        }
    }

    pub fn input_tips(self) -> Vec<String> {
        picks(
            self,
            &["Por favor, selecciona un archivo de imagen válido"],
            &["Please select a valid image file"],
        )
    }

    pub fn input_next_steps(self) -> Vec<String> {
        picks(
            self,
            &["Sube una foto o captura de tu diagrama UML de clases"],
            &["Upload a photo or screenshot of your UML class diagram"],
        )
    }

    pub fn backend_failure(self, err: &ScanError) -> String {
        match (self, err) {
            (Locale::Es, ScanError::Timeout(_)) => {
                "⏱️ El servicio de análisis tardó demasiado en responder".to_string()
            }
            (Locale::En, ScanError::Timeout(_)) => {
                "⏱️ The analysis service took too long to respond".to_string()
            }
            (Locale::Es, ScanError::MalformedResponse { .. }) => {
                "❌ No se pudo interpretar el resultado del análisis de la imagen".to_string()
            }
            (Locale::En, ScanError::MalformedResponse { .. }) => {
                "❌ The image analysis result could not be interpreted".to_string()
            }
            (Locale::Es, _) => {
                "❌ Error al procesar la imagen: el servicio de análisis no está disponible".to_string()
            }
            (Locale::En, _) => {
                "❌ Error processing the image: the analysis service is unavailable".to_string()
            }
        }
    }

    pub fn retry_later_tip(self) -> String {
        pick(
            self,
            "⏳ Intenta de nuevo en unos minutos",
            "⏳ Try again in a few minutes",
        )
    }

    pub fn invalid_request(self) -> String {
        pick(
            self,
            "❌ La solicitud no tiene el formato esperado",
            "❌ The request does not have the expected format",
        )
    }

    // --- contextual help ---

    pub fn welcome(self) -> String {
        pick(
            self,
            "👋 Tu diagrama está vacío. ¡Empecemos a modelar!",
            "👋 Your diagram is empty. Let's start modeling!",
        )
    }

    pub fn welcome_tips(self) -> Vec<String> {
        picks(
            self,
            &[
                "🧱 Empieza por las entidades principales de tu dominio",
                "📷 También puedes escanear una foto de un diagrama hecho a mano",
                "💬 Escribe, por ejemplo: 'agrega la clase Cliente'",
            ],
            &[
                "🧱 Start with the main entities of your domain",
                "📷 You can also scan a photo of a hand-drawn diagram",
                "💬 Try typing: 'add class Customer'",
            ],
        )
    }

    pub fn welcome_next_steps(self) -> Vec<String> {
        picks(
            self,
            &[
                "Crea tu primera clase",
                "Agrega atributos a cada clase",
                "Conecta las clases con relaciones",
            ],
            &[
                "Create your first class",
                "Add attributes to each class",
                "Connect classes with relations",
            ],
        )
    }

    pub fn diagram_summary(self, classes: usize, relations: usize) -> String {
        match self {
            Locale::Es => format!("📊 Tu diagrama tiene {classes} clases y {relations} relaciones"),
            Locale::En => format!("📊 Your diagram has {classes} classes and {relations} relations"),
        }
    }

    pub fn help_suggestions(self, classes: usize, relations: usize) -> String {
        match self {
            Locale::Es => format!(
                "💡 Te sugiero agregar {classes} clases y {relations} relaciones a tu diagrama"
            ),
            Locale::En => format!(
                "💡 I suggest adding {classes} classes and {relations} relations to your diagram"
            ),
        }
    }

    pub fn class_without_attributes(self, name: &str) -> String {
        match self {
            Locale::Es => format!("📝 La clase {name} no tiene atributos"),
            Locale::En => format!("📝 Class {name} has no attributes"),
        }
    }

    pub fn isolated_class(self, name: &str) -> String {
        match self {
            Locale::Es => format!("🔗 La clase {name} no está conectada con ninguna otra"),
            Locale::En => format!("🔗 Class {name} is not connected to any other class"),
        }
    }

    pub fn large_class(self, name: &str, attributes: usize) -> String {
        match self {
            Locale::Es => format!(
                "✂️ La clase {name} tiene {attributes} atributos; considera dividirla"
            ),
            Locale::En => format!(
                "✂️ Class {name} has {attributes} attributes; consider splitting it"
            ),
        }
    }

    pub fn message_not_understood(self) -> String {
        pick(
            self,
            "💬 Prueba con: 'agrega la clase Cliente' o 'relaciona Pedido con Cliente'",
            "💬 Try: 'add class Customer' or 'connect Order with Customer'",
        )
    }

    pub fn review_suggestions_step(self) -> String {
        pick(
            self,
            "Revisa las sugerencias y aplica las que te sirvan",
            "Review the suggestions and apply the ones you need",
        )
    }

    pub fn assistant_unavailable_tip(self) -> String {
        pick(
            self,
            "🤖 El asistente de IA no respondió; estas sugerencias son básicas",
            "🤖 The AI assistant did not respond; these suggestions are basic",
        )
    }

    // --- cardinality ---

    pub fn cardinality_reason(self, key: CardinalityReason, source: &str, target: &str) -> String {
        match (self, key) {
            (Locale::Es, CardinalityReason::ManyToMany) => format!(
                "{source} y {target} se referencian mutuamente con colecciones"
            ),
            (Locale::En, CardinalityReason::ManyToMany) => format!(
                "{source} and {target} reference each other through collections"
            ),
            (Locale::Es, CardinalityReason::SourceHoldsMany) => format!(
                "{source} contiene una colección de {target}"
            ),
            (Locale::En, CardinalityReason::SourceHoldsMany) => format!(
                "{source} holds a collection of {target}"
            ),
            (Locale::Es, CardinalityReason::TargetHoldsMany) => format!(
                "{target} contiene una colección de {source}"
            ),
            (Locale::En, CardinalityReason::TargetHoldsMany) => format!(
                "{target} holds a collection of {source}"
            ),
            (Locale::Es, CardinalityReason::TargetReferencesSource) => format!(
                "{target} tiene una clave foránea hacia {source}"
            ),
            (Locale::En, CardinalityReason::TargetReferencesSource) => format!(
                "{target} has a foreign key to {source}"
            ),
            (Locale::Es, CardinalityReason::SourceReferencesTarget) => format!(
                "{source} tiene una clave foránea hacia {target}"
            ),
            (Locale::En, CardinalityReason::SourceReferencesTarget) => format!(
                "{source} has a foreign key to {target}"
            ),
            (Locale::Es, CardinalityReason::Default) => format!(
                "Sin evidencia en los atributos; se asume que un {source} se relaciona con varios {target}"
            ),
            (Locale::En, CardinalityReason::Default) => format!(
                "No evidence in the attributes; assuming one {source} relates to many {target}"
            ),
        }
    }
}

/// Why a cardinality pair was suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityReason {
    ManyToMany,
    SourceHoldsMany,
    TargetHoldsMany,
    TargetReferencesSource,
    SourceReferencesTarget,
    Default,
}
