//! Deployment-time content: the course catalog and the quiz question bank.
//!
//! Both are immutable. Counts are always taken from these slices, never
//! hard-coded elsewhere.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub video_url: &'static str,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone)]
pub struct QuizQuestion {
    pub id: u32,
    pub question: &'static str,
    pub options: &'static [&'static str],
    pub correct_answer: usize,
}

pub static COURSES: &[Course] = &[
    Course {
        id: "1",
        title: "Introdução à Manutenção Aeronáutica",
        description: "Fundamentos básicos da manutenção de aeronaves.",
        video_url: "https://www.youtube.com/embed/eglDumaJeEg",
        duration_minutes: 15,
    },
    Course {
        id: "2",
        title: "Sistemas de Propulsão",
        description: "Estudo detalhado dos sistemas de propulsão de aeronaves.",
        video_url: "https://www.youtube.com/embed/SSyAkFD06Pk",
        duration_minutes: 10,
    },
    Course {
        id: "3",
        title: "Manutenção Preventiva",
        description: "Práticas essenciais de manutenção preventiva.",
        video_url: "https://www.youtube.com/embed/RRbmRfJy_-I",
        duration_minutes: 12,
    },
];

pub fn find_course(id: &str) -> Option<&'static Course> {
    COURSES.iter().find(|course| course.id == id)
}

pub fn course_count() -> usize {
    COURSES.len()
}

pub static QUESTIONS: &[QuizQuestion] = &[
    QuizQuestion {
        id: 1,
        question: "Qual é o principal objetivo da manutenção preventiva em aeronaves?",
        options: &[
            "Apenas corrigir falhas após ocorrerem",
            "Prevenir falhas e garantir a segurança operacional",
            "Reduzir custos de manutenção",
            "Aumentar a velocidade da aeronave",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 2,
        question: "O que significa a sigla ATA na aviação?",
        options: &[
            "Air Transport Association",
            "Aircraft Technical Association",
            "Aviation Training Academy",
            "Aircraft Technical Analysis",
        ],
        correct_answer: 0,
    },
    QuizQuestion {
        id: 3,
        question: "Qual documento é essencial para registrar todas as manutenções realizadas em uma aeronave?",
        options: &[
            "Manual de Voo",
            "Logbook da Aeronave",
            "Manual do Proprietário",
            "Certificado de Registro",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 4,
        question: "O que é um AD (Airworthiness Directive)?",
        options: &[
            "Um documento opcional de manutenção",
            "Uma diretriz obrigatória de aeronavegabilidade",
            "Um manual de procedimentos",
            "Um certificado de inspeção",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 5,
        question: "Qual é a função principal do sistema hidráulico em uma aeronave?",
        options: &[
            "Apenas controlar o trem de pouso",
            "Transmitir força através de fluidos pressurizados",
            "Controlar a temperatura da cabine",
            "Fornecer energia elétrica",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 6,
        question: "O que é o sistema de pressurização da cabine?",
        options: &[
            "Sistema que apenas controla a temperatura",
            "Sistema que mantém a pressão adequada para respiração em altitude",
            "Sistema de ar condicionado",
            "Sistema de ventilação",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 7,
        question: "Qual é a função do sistema anti-gelo em aeronaves?",
        options: &[
            "Apenas melhorar a aerodinâmica",
            "Prevenir a formação de gelo em superfícies críticas",
            "Controlar a temperatura do motor",
            "Melhorar a visibilidade do piloto",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 8,
        question: "O que é um sistema redundante em aeronaves?",
        options: &[
            "Um sistema desnecessário",
            "Um sistema de backup para funções críticas",
            "Um sistema que usa mais combustível",
            "Um sistema opcional",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 9,
        question: "Qual é a importância da inspeção visual em manutenção aeronáutica?",
        options: &[
            "Apenas para fins estéticos",
            "Detectar problemas visíveis e prevenir falhas",
            "Satisfazer requisitos burocráticos",
            "Reduzir o tempo de manutenção",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 10,
        question: "O que é o sistema de oxigênio de emergência?",
        options: &[
            "Sistema de ar condicionado",
            "Sistema que fornece oxigênio em caso de despressurização",
            "Sistema de ventilação da cabine",
            "Sistema de filtragem de ar",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 11,
        question: "Qual é a função do sistema de freios em aeronaves?",
        options: &[
            "Apenas parar a aeronave no solo",
            "Controlar a velocidade no solo e durante o pouso",
            "Auxiliar na decolagem",
            "Controlar a direção no ar",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 12,
        question: "O que é o sistema de navegação inercial?",
        options: &[
            "Sistema de entretenimento",
            "Sistema que calcula a posição da aeronave",
            "Sistema de comunicação",
            "Sistema de iluminação",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 13,
        question: "Qual é a importância da documentação em manutenção aeronáutica?",
        options: &[
            "Apenas para fins burocráticos",
            "Garantir rastreabilidade e conformidade",
            "Aumentar o tempo de manutenção",
            "Satisfazer apenas requisitos legais",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 14,
        question: "O que é o sistema de alerta de proximidade do solo (GPWS)?",
        options: &[
            "Sistema de entretenimento",
            "Sistema que alerta sobre proximidade do solo",
            "Sistema de navegação",
            "Sistema de comunicação",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 15,
        question: "Qual é a função do sistema de combustível em aeronaves?",
        options: &[
            "Apenas armazenar combustível",
            "Armazenar e distribuir combustível para os motores",
            "Controlar a temperatura do motor",
            "Melhorar a aerodinâmica",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 16,
        question: "O que é o sistema de controle de voo?",
        options: &[
            "Sistema de entretenimento",
            "Sistema que controla as superfícies de voo",
            "Sistema de navegação",
            "Sistema de comunicação",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 17,
        question: "Qual é a importância da calibração de instrumentos?",
        options: &[
            "Apenas para fins estéticos",
            "Garantir precisão e confiabilidade das medições",
            "Satisfazer requisitos burocráticos",
            "Reduzir o tempo de manutenção",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 18,
        question: "O que é o sistema de detecção de fogo?",
        options: &[
            "Sistema de iluminação",
            "Sistema que detecta e alerta sobre incêndios",
            "Sistema de ventilação",
            "Sistema de ar condicionado",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 19,
        question: "Qual é a função do sistema de ar condicionado em aeronaves?",
        options: &[
            "Apenas controlar a temperatura",
            "Controlar temperatura, pressão e qualidade do ar",
            "Apenas ventilar a cabine",
            "Apenas filtrar o ar",
        ],
        correct_answer: 1,
    },
    QuizQuestion {
        id: 20,
        question: "O que é o sistema de comunicação de voo?",
        options: &[
            "Sistema de entretenimento",
            "Sistema que permite comunicação com torre e outras aeronaves",
            "Sistema de navegação",
            "Sistema de iluminação",
        ],
        correct_answer: 1,
    },
];

pub fn question_count() -> usize {
    QUESTIONS.len()
}

static VIDEO_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?/]{11})")
        .expect("video id regex is valid")
});

/// Extracts the 11-character YouTube video id from any of the URL forms the
/// catalog may carry.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    VIDEO_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
